use serde::{Deserialize, Serialize};

pub const UNKNOWN_SECTION: &str = "Unknown";

/// A named page region the recorder can attribute events to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionDef {
    pub id: String,
    pub name: String,
}

impl SectionDef {
    pub fn new(id: &str, name: &str) -> Self {
        Self { id: id.to_string(), name: name.to_string() }
    }
}

/// The landing page's regions, top to bottom.
pub fn default_sections() -> Vec<SectionDef> {
    vec![
        SectionDef::new("hero", "Hero"),
        SectionDef::new("problem-statement", "Problem Statement"),
        SectionDef::new("how-it-works", "How It Works"),
        SectionDef::new("features-section", "Features"),
        SectionDef::new("testimonials", "Testimonials"),
        SectionDef::new("trust-privacy", "Trust & Privacy"),
        SectionDef::new("faq", "FAQ"),
        SectionDef::new("cta-section", "CTA"),
    ]
}

/// Document-relative vertical extent of a rendered section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionBounds {
    pub top: f64,
    pub height: f64,
}

/// Geometry of the page as last reported by the UI layer.
///
/// Sections without measured bounds are treated as not rendered.
#[derive(Debug, Clone)]
pub struct PageLayout {
    viewport: Option<Viewport>,
    pub scroll_y: f64,
    sections: Vec<(SectionDef, Option<SectionBounds>)>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Viewport {
    height: f64,
    document_height: f64,
}

impl PageLayout {
    pub fn new(sections: Vec<SectionDef>) -> Self {
        Self {
            viewport: None,
            scroll_y: 0.0,
            sections: sections.into_iter().map(|s| (s, None)).collect(),
        }
    }

    pub fn set_viewport(&mut self, viewport_height: f64, document_height: f64) {
        self.viewport = Some(Viewport {
            height: viewport_height.max(0.0),
            document_height: document_height.max(0.0),
        });
    }

    pub fn viewport_height(&self) -> f64 {
        self.viewport.map_or(0.0, |v| v.height)
    }

    /// Records where a section sits. Unknown ids are ignored.
    pub fn set_section_bounds(&mut self, id: &str, bounds: SectionBounds) -> bool {
        match self.sections.iter_mut().find(|(def, _)| def.id == id) {
            Some((_, slot)) => {
                *slot = Some(bounds);
                true
            }
            None => false,
        }
    }

    /// Name of the section spanning the vertical midpoint of the viewport.
    pub fn current_section(&self) -> &str {
        let midpoint = self.scroll_y + self.viewport_height() / 2.0;

        for (def, bounds) in &self.sections {
            if let Some(b) = bounds {
                if midpoint >= b.top && midpoint <= b.top + b.height {
                    return &def.name;
                }
            }
        }

        UNKNOWN_SECTION
    }

    /// Rounded percentage of the scrollable height currently scrolled.
    ///
    /// Zero until a viewport is reported. A page that cannot scroll counts
    /// as fully read once the visitor has moved at all.
    pub fn scroll_percent(&self) -> u32 {
        let Some(viewport) = self.viewport else { return 0 };
        let scrollable = viewport.document_height - viewport.height;
        if scrollable <= 0.0 {
            return if self.scroll_y > 0.0 { 100 } else { 0 };
        }
        let pct = (self.scroll_y / scrollable * 100.0).round();
        pct.clamp(0.0, 100.0) as u32
    }
}
