//! The live presentation surface: the rendered layout plus the preview
//! state applied on top of it (scale transform, position, container height)
//! and any transient stylesheet overrides.
//!
//! Export must run on the untransformed natural layout. `acquire_natural`
//! and `install` hand out guards that put the original state back when they
//! drop, on success, error or unwind alike.

use std::ops::{Deref, DerefMut};

use serde::Serialize;

use crate::export::place::{place, PlacedPage, PlacementStyle};
use crate::render::layout::{Page, PX_PER_CM};
use crate::render::Template;

/// Left offset applied to the surface while exporting.
pub const EXPORT_LEFT_OFFSET_PX: f32 = 0.2 * PX_PER_CM;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Static,
    Relative,
}

/// Preview presentation values. `container_height: None` means auto.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Presentation {
    pub scale: f32,
    pub offset_x: f32,
    pub position: Position,
    pub left: f32,
    pub container_height: Option<f32>,
}

impl Default for Presentation {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            position: Position::Static,
            left: 0.0,
            container_height: None,
        }
    }
}

impl Presentation {
    /// Identity transform, natural height, nudged 0.2 cm to the right.
    pub fn natural() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            position: Position::Relative,
            left: EXPORT_LEFT_OFFSET_PX,
            container_height: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StyleOverride {
    /// `h1, h2 { line-height: calc(<em>em + <px>px) }`
    HeadingLineHeight { em: f32, px: f32 },
    /// `.pdf-text-adjust { top: <text>px }` and `.pdf-icon-adjust { top: <icon>px }`
    BaselineNudge { text: f32, icon: f32 },
}

impl StyleOverride {
    /// The transient override a template needs during export.
    pub fn for_template(template: Template) -> Self {
        match template {
            Template::Classic => StyleOverride::HeadingLineHeight { em: 1.2, px: 10.0 },
            Template::Modern => StyleOverride::BaselineNudge {
                text: -6.0,
                icon: 2.0,
            },
            Template::Creative => StyleOverride::BaselineNudge {
                text: -7.0,
                icon: 0.0,
            },
        }
    }

    pub fn css(&self) -> String {
        match self {
            StyleOverride::HeadingLineHeight { em, px } => {
                format!("h1, h2 {{ line-height: calc({em}em + {px}px) !important; }}")
            }
            StyleOverride::BaselineNudge { text, icon } => {
                let mut css = format!(".pdf-text-adjust {{ position: relative; top: {text}px; }}");
                if *icon != 0.0 {
                    css.push_str(&format!(
                        " .pdf-icon-adjust {{ position: relative; top: {icon}px; }}"
                    ));
                }
                css
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct PreviewSurface {
    template: Template,
    page: Page,
    presentation: Presentation,
    overrides: Vec<StyleOverride>,
    override_removals: u64,
}

impl PreviewSurface {
    pub fn new(page: Page, template: Template) -> Self {
        Self {
            template,
            page,
            presentation: Presentation::default(),
            overrides: Vec::new(),
            override_removals: 0,
        }
    }

    /// Swaps in a freshly rendered layout. Presentation state is kept.
    pub fn redraw(&mut self, page: Page, template: Template) {
        self.page = page;
        self.template = template;
    }

    pub fn template(&self) -> Template {
        self.template
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn presentation(&self) -> Presentation {
        self.presentation
    }

    pub fn set_presentation(&mut self, presentation: Presentation) {
        self.presentation = presentation;
    }

    /// CSS text of the overrides currently installed.
    pub fn stylesheet(&self) -> Vec<String> {
        self.overrides.iter().map(StyleOverride::css).collect()
    }

    /// How many transient overrides have been removed over the surface's life.
    pub fn override_removals(&self) -> u64 {
        self.override_removals
    }

    pub fn placement_style(&self) -> PlacementStyle {
        let mut style = PlacementStyle::default();
        for rule in &self.overrides {
            match *rule {
                StyleOverride::HeadingLineHeight { em, px } => {
                    style.heading_line_height = Some((em, px))
                }
                StyleOverride::BaselineNudge { text, icon } => {
                    style.text_nudge = text;
                    style.icon_nudge = icon;
                }
            }
        }
        style
    }

    /// Places the current layout under the installed overrides.
    pub fn place(&self) -> PlacedPage {
        place(&self.page, &self.placement_style())
    }

    /// Resets the preview to the natural layout until the guard drops.
    pub fn acquire_natural(&mut self) -> NaturalLayout<'_> {
        let saved = self.presentation;
        self.presentation = Presentation::natural();
        NaturalLayout {
            surface: self,
            saved,
        }
    }

    /// Installs a transient override until the guard drops.
    pub fn install(&mut self, rule: StyleOverride) -> InstalledOverride<'_> {
        self.overrides.push(rule);
        InstalledOverride {
            surface: self,
            rule,
        }
    }
}

pub struct NaturalLayout<'a> {
    surface: &'a mut PreviewSurface,
    saved: Presentation,
}

impl Deref for NaturalLayout<'_> {
    type Target = PreviewSurface;

    fn deref(&self) -> &PreviewSurface {
        self.surface
    }
}

impl DerefMut for NaturalLayout<'_> {
    fn deref_mut(&mut self) -> &mut PreviewSurface {
        self.surface
    }
}

impl Drop for NaturalLayout<'_> {
    fn drop(&mut self) {
        self.surface.presentation = self.saved;
    }
}

pub struct InstalledOverride<'a> {
    surface: &'a mut PreviewSurface,
    rule: StyleOverride,
}

impl Deref for InstalledOverride<'_> {
    type Target = PreviewSurface;

    fn deref(&self) -> &PreviewSurface {
        self.surface
    }
}

impl Drop for InstalledOverride<'_> {
    fn drop(&mut self) {
        if let Some(index) = self.surface.overrides.iter().rposition(|r| *r == self.rule) {
            self.surface.overrides.remove(index);
            self.surface.override_removals += 1;
        }
    }
}
