//! Byte layout of a program's uniform block, following the WGSL
//! host-shareable rules for the member types materials use.

use super::UniformKind;

#[derive(Debug, Clone, PartialEq)]
pub struct UniformEntry {
    pub name: String,
    pub kind: UniformKind,
    pub offset: u64,
}

/// Offsets of every member of a uniform struct, in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformLayout {
    entries: Vec<UniformEntry>,
    size: u64,
}

const STRUCT_ALIGN: u64 = 16;

fn align_up(value: u64, align: u64) -> u64 {
    value.div_ceil(align) * align
}

impl UniformLayout {
    pub fn new<'a>(members: impl IntoIterator<Item = (&'a str, UniformKind)>) -> Self {
        let mut entries = Vec::new();
        let mut cursor = 0;

        for (name, kind) in members {
            let offset = align_up(cursor, kind.align());
            entries.push(UniformEntry {
                name: name.to_string(),
                kind,
                offset,
            });
            cursor = offset + kind.size();
        }

        Self {
            entries,
            size: align_up(cursor, STRUCT_ALIGN),
        }
    }

    pub fn entry(&self, name: &str) -> Option<&UniformEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn entries(&self) -> &[UniformEntry] {
        &self.entries
    }

    /// Struct size in bytes, a multiple of 16
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Reads a member back out of a staged block as floats
    pub fn read<'b>(&self, block: &'b [u8], name: &str) -> Option<&'b [f32]> {
        let entry = self.entry(name)?;
        let start = entry.offset as usize;
        let bytes = block.get(start..start + entry.kind.size() as usize)?;
        bytemuck::try_cast_slice(bytes).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lit_block_offsets() {
        let layout = UniformLayout::new([
            ("uModelMatrix", UniformKind::Mat4),
            ("uViewMatrix", UniformKind::Mat4),
            ("uProjectionMatrix", UniformKind::Mat4),
            ("uColor", UniformKind::Vec4),
            ("uLightDirection", UniformKind::Vec3),
            ("uLightColor", UniformKind::Vec3),
            ("uAmbientColor", UniformKind::Vec3),
        ]);

        let offsets: Vec<u64> = layout.entries().iter().map(|e| e.offset).collect();
        assert_eq!(offsets, vec![0, 64, 128, 192, 208, 224, 240]);
        assert_eq!(layout.size(), 256);
    }

    #[test]
    fn test_scalar_packs_after_vec3() {
        let layout = UniformLayout::new([("a", UniformKind::Vec3), ("b", UniformKind::Float)]);
        assert_eq!(layout.entry("b").unwrap().offset, 12);
        assert_eq!(layout.size(), 16);
    }

    #[test]
    fn test_empty_block() {
        let layout = UniformLayout::new(std::iter::empty());
        assert_eq!(layout.size(), 0);
        assert!(layout.entry("uColor").is_none());
    }
}
