/// Subset of a glTF metallic-roughness material that travels with the drawables.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    name: String,
    color_factor: [f32; 4],
    metallic_factor: f32,
    roughness_factor: f32,
    double_sided: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self::new()
    }
}

impl Material {
    pub fn new() -> Self {
        Self {
            name: String::new(),
            color_factor: [1.0, 1.0, 1.0, 1.0],
            metallic_factor: 1.0,
            roughness_factor: 1.0,
            double_sided: false,
        }
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_owned();
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn set_color_factor(&mut self, factor: [f32; 4]) {
        self.color_factor = factor;
    }

    pub fn get_color_factor(&self) -> [f32; 4] {
        self.color_factor
    }

    pub fn set_metallic_factor(&mut self, factor: f32) {
        self.metallic_factor = factor;
    }

    pub fn get_metallic_factor(&self) -> f32 {
        self.metallic_factor
    }

    pub fn set_roughness_factor(&mut self, factor: f32) {
        self.roughness_factor = factor;
    }

    pub fn get_roughness_factor(&self) -> f32 {
        self.roughness_factor
    }

    pub fn set_double_sided(&mut self, double_sided: bool) {
        self.double_sided = double_sided;
    }

    pub fn is_double_sided(&self) -> bool {
        self.double_sided
    }
}
