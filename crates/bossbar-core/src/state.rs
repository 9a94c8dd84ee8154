//! Mutable bar state: text, fill percentage and color.

use crate::{AttributeValue, BarColor};

/// Placed between title and subtitle in the full title.
pub const SUBTITLE_SEPARATOR: &str = "\n\n";

/// State of one bar as seen by a client.
///
/// A bar has one default state, and a diverse bar may hold additional
/// per-client copies. The full title is always derived, never stored.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BarState {
    title: String,
    sub_title: String,
    health: AttributeValue,
    color: BarColor,
}

impl BarState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text above the bar. May be empty.
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Optional text below the bar. May be empty.
    pub fn sub_title(&self) -> &str {
        &self.sub_title
    }

    pub fn set_sub_title(&mut self, sub_title: impl Into<String>) {
        self.sub_title = sub_title.into();
    }

    /// Title followed by the subtitle (if any) after a blank line.
    pub fn full_title(&self) -> String {
        if self.sub_title.is_empty() {
            return self.title.clone();
        }
        let mut text =
            String::with_capacity(self.title.len() + SUBTITLE_SEPARATOR.len() + self.sub_title.len());
        text.push_str(&self.title);
        text.push_str(SUBTITLE_SEPARATOR);
        text.push_str(&self.sub_title);
        text
    }

    /// Fill percentage as a fraction in `[0, 1]`.
    pub fn percentage(&self) -> f32 {
        self.health.fraction()
    }

    /// Sets the fill percentage. Values outside `[0, 1]` are clamped.
    pub fn set_percentage(&mut self, percentage: f32) {
        self.health.set_fraction(percentage);
    }

    pub fn health(&self) -> &AttributeValue {
        &self.health
    }

    /// Replaces the health attribute with a copy of `health`.
    pub fn set_health(&mut self, health: AttributeValue) {
        self.health = health;
    }

    pub fn color(&self) -> BarColor {
        self.color
    }

    pub fn set_color(&mut self, color: BarColor) {
        self.color = color;
    }
}
