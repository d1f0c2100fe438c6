use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// Per-draw shader parameters, laid out as the shader's `ShaderParameters`.
///
/// The matrix is stored column-major, the convention of both `glam::Mat4`
/// and WGSL `mat4x4<f32>`, so no transpose happens between camera and shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ShaderParameters {
    pub transformation: [[f32; 4]; 4],
}

const _: () = assert!(std::mem::size_of::<ShaderParameters>() == 64);

impl ShaderParameters {
    pub fn new(transformation: Mat4) -> Self {
        Self {
            transformation: transformation.to_cols_array_2d(),
        }
    }

    pub fn transformation(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.transformation)
    }
}

impl Default for ShaderParameters {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn columns_are_contiguous_in_memory() {
        let m = Mat4::from_translation(glam::vec3(3.0, 4.0, 5.0));
        let params = ShaderParameters::new(m);
        let floats: &[f32] = bytemuck::cast_slice(&params.transformation);
        // Translation lives in the fourth column: floats 12..15.
        assert_eq!(&floats[12..16], &[3.0, 4.0, 5.0, 1.0]);
    }

    #[test]
    fn matrix_survives_the_record() {
        let m = Mat4::from_cols(
            Vec4::new(1.0, 2.0, 3.0, 4.0),
            Vec4::new(5.0, 6.0, 7.0, 8.0),
            Vec4::new(9.0, 10.0, 11.0, 12.0),
            Vec4::new(13.0, 14.0, 15.0, 16.0),
        );
        assert_eq!(ShaderParameters::new(m).transformation(), m);
    }
}
