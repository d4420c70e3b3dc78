//! String-keyed style collaborator.
//!
//! Layout and routing never read styles; leaf widgets do. Missing keys are
//! expected absence, so every getter takes the caller's default instead of
//! returning an error.

use std::collections::HashMap;

use crate::geometry::Insets;

/// Named visual parameters handed in through
/// [`crate::root::RootConfig`].
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    floats: HashMap<String, f32>,
    insets: HashMap<String, Insets>,
    colors: HashMap<String, u32>,
    strings: HashMap<String, String>,
}

impl StyleSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_float(&mut self, key: impl Into<String>, value: f32) {
        self.floats.insert(key.into(), value);
    }

    pub fn float_or(&self, key: &str, default: f32) -> f32 {
        self.floats.get(key).copied().unwrap_or(default)
    }

    pub fn set_insets(&mut self, key: impl Into<String>, value: Insets) {
        self.insets.insert(key.into(), value);
    }

    pub fn insets_or(&self, key: &str, default: Insets) -> Insets {
        self.insets.get(key).copied().unwrap_or(default)
    }

    /// Colors are opaque packed values; the render collaborator decides
    /// the channel layout.
    pub fn set_color(&mut self, key: impl Into<String>, value: u32) {
        self.colors.insert(key.into(), value);
    }

    pub fn color_or(&self, key: &str, default: u32) -> u32 {
        self.colors.get(key).copied().unwrap_or(default)
    }

    pub fn set_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.strings.insert(key.into(), value.into());
    }

    pub fn string_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.strings.get(key).map(String::as_str).unwrap_or(default)
    }

    pub fn len(&self) -> usize {
        self.floats.len() + self.insets.len() + self.colors.len() + self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_the_caller_default() {
        let mut styles = StyleSheet::new();
        styles.set_float("button.padding", 6.0);
        assert_eq!(styles.float_or("button.padding", 0.0), 6.0);
        assert_eq!(styles.float_or("button.margin", 2.0), 2.0);
        assert_eq!(styles.color_or("button.tint", 0xffff_ffff), 0xffff_ffff);
        assert_eq!(styles.string_or("button.font", "default"), "default");
    }
}
