//! Map file fixtures shaped like GNU ld `--Map` output.

use std::path::{Path, PathBuf};

use crate::ops::verify::DEFAULT_REGISTRATION_MARKER;

/// Builder for linker map text.
#[derive(Debug, Clone, Default)]
pub struct MapFileFixture {
    lines: Vec<String>,
}

impl MapFileFixture {
    pub fn new() -> Self {
        let mut fixture = MapFileFixture::default();
        fixture.raw("Archive member included to satisfy reference by file (symbol)");
        fixture.raw("");
        fixture.raw("Memory Configuration");
        fixture.raw("");
        fixture
    }

    /// Append a raw line.
    pub fn raw(&mut self, line: impl Into<String>) -> &mut Self {
        self.lines.push(line.into());
        self
    }

    /// An input section line for an object file at `address`.
    pub fn object(&mut self, section: &str, address: u64, size: u64, path: &str) -> &mut Self {
        self.raw(format!(
            " {:<16} 0x{:08x}       0x{:x} {}",
            section, address, size, path
        ))
    }

    /// A long section name on its own line, followed by the placement line.
    pub fn wrapped_object(&mut self, section: &str, address: u64, size: u64, path: &str) -> &mut Self {
        self.raw(format!(" {}", section));
        self.raw(format!("                0x{:08x}       0x{:x} {}", address, size, path))
    }

    /// A `.text` object placed from the build directory `dir`.
    pub fn module_object(&mut self, dir: &str, file: &str, address: u64) -> &mut Self {
        let path = module_object_path(dir, file);
        self.object(".text", address, 0x54, &path)
    }

    /// One registration table entry.
    pub fn registration_entry(&mut self, dir: &str, address: u64) -> &mut Self {
        let path = module_object_path(dir, "registration");
        self.raw(format!(
            " {} 0x{:08x}        0x4 {}",
            DEFAULT_REGISTRATION_MARKER, address, path
        ))
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.clone()
    }

    pub fn text(&self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }

    /// Write the map to `<dir>/<name>`.
    pub fn write_to(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.text()).expect("failed to write map fixture");
        path
    }
}

/// Object path inside a build-output directory.
pub fn module_object_path(dir: &str, file: &str) -> String {
    format!("/project/build/lib4f2/{}/{}.cpp.o", dir, file)
}
