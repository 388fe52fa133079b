/// Unlit color material. Wireframe meshes are drawn with the line-raster
/// pipeline instead of the fill pipeline.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Material {
    pub color: [f32; 3],
    pub wireframe: bool,
}

impl Material {
    pub fn from_hex(hex: u32, wireframe: bool) -> Self {
        Self {
            color: [
                ((hex >> 16) & 0xFF) as f32 / 255.0,
                ((hex >> 8) & 0xFF) as f32 / 255.0,
                (hex & 0xFF) as f32 / 255.0,
            ],
            wireframe,
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: [0.6, 0.6, 0.6],
            wireframe: false,
        }
    }
}

/// Fixed name -> material table applied after load. Exact match only;
/// unmatched meshes keep whatever material they already carry.
pub fn material_for(name: &str) -> Option<Material> {
    match name {
        "me" => Some(Material::from_hex(0x00B9E8, true)),
        "icons" => Some(Material::from_hex(0xFF0000, false)),
        "string" => Some(Material::from_hex(0x00FF00, false)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_decodes_to_unit_floats() {
        let m = Material::from_hex(0x00B9E8, true);
        assert_eq!(m.color[0], 0.0);
        assert!((m.color[1] - 185.0 / 255.0).abs() < 1e-6);
        assert!((m.color[2] - 232.0 / 255.0).abs() < 1e-6);
        assert!(m.wireframe);
    }

    #[test]
    fn table_hits_are_exact_matches() {
        assert!(material_for("me").unwrap().wireframe);
        assert!(!material_for("icons").unwrap().wireframe);
        assert!(material_for("string").is_some());
    }

    #[test]
    fn table_misses_include_case_variants() {
        assert!(material_for("Me").is_none());
        assert!(material_for("String").is_none());
        assert!(material_for("body").is_none());
        assert!(material_for("").is_none());
    }
}
