//! Built-in interactive SVG templates.
//!
//! Each template has interactive markup for the storefront block and a
//! static preview for the admin gallery. Templates are copied into a shop's
//! image table by `sync-images` (or `studio-cli catalog sync`).

use interactive_studio_core::InteractiveSvg;

struct CatalogEntry {
    external_id: &'static str,
    title: &'static str,
    svg_html: &'static str,
    preview_html: &'static str,
}

impl CatalogEntry {
    fn to_svg(&self) -> InteractiveSvg {
        InteractiveSvg {
            external_id: self.external_id.to_string(),
            title: self.title.to_string(),
            svg_html: self.svg_html.trim().to_string(),
            preview_html: self.preview_html.trim().to_string(),
        }
    }
}

const CLICK_CIRCLE: CatalogEntry = CatalogEntry {
    external_id: "1",
    title: "Click Circle",
    svg_html: r##"
<svg xmlns="http://www.w3.org/2000/svg" width="300" height="150">
  <rect width="300" height="150" fill="#d0f0ff"/>
  <text x="50%" y="50%" text-anchor="middle" dy=".3em" font-size="20">
    Click Circle!
  </text>
  <circle cx="150" cy="100" r="20" fill="#ff7f50" id="myCircle"/>
  <script>
    const circle = document.getElementById('myCircle');
    circle.addEventListener('click', () => alert('Circle clicked!'));
  </script>
</svg>
"##,
    preview_html: r##"
<div style="width:300px; height:150px;">
  <svg xmlns="http://www.w3.org/2000/svg" width="100%" height="100%">
    <rect width="300" height="150" fill="#d0f0ff"/>
    <circle cx="150" cy="100" r="20" fill="#ff7f50"/>
  </svg>
</div>
"##,
};

const CLICK_RECTANGLE: CatalogEntry = CatalogEntry {
    external_id: "2",
    title: "Click Rectangle",
    svg_html: r##"
<svg xmlns="http://www.w3.org/2000/svg" width="300" height="150">
  <rect width="300" height="150" fill="#fff0d0"/>
  <text x="50%" y="40" text-anchor="middle" font-size="20">Click the rectangle!</text>
  <rect x="100" y="60" width="100" height="50" fill="#6a5acd" id="myRect"/>
  <script>
    const rect = document.getElementById('myRect');
    rect.addEventListener('click', () => alert('Rectangle clicked!'));
  </script>
</svg>
"##,
    preview_html: r##"
<div style="width:300px; height:150px;">
  <svg xmlns="http://www.w3.org/2000/svg" width="100%" height="100%">
    <rect width="300" height="150" fill="#fff0d0"/>
    <rect x="100" y="60" width="100" height="50" fill="#6a5acd"/>
  </svg>
</div>
"##,
};

const HOVER_CIRCLE: CatalogEntry = CatalogEntry {
    external_id: "3",
    title: "Hover Circle",
    svg_html: r##"
<svg xmlns="http://www.w3.org/2000/svg" width="300" height="150">
  <rect width="300" height="150" fill="#f0f0f0"/>
  <text x="50%" y="30" text-anchor="middle" font-size="18">Hover over the circle!</text>
  <circle cx="150" cy="90" r="30" fill="#ff6347" id="hoverCircle"/>
  <script>
    const c = document.getElementById('hoverCircle');
    c.addEventListener('mouseenter', () => c.setAttribute('fill', '#32cd32'));
    c.addEventListener('mouseleave', () => c.setAttribute('fill', '#ff6347'));
  </script>
</svg>
"##,
    preview_html: r##"
<div style="width:300px; height:150px;">
  <svg xmlns="http://www.w3.org/2000/svg" width="100%" height="100%">
    <rect width="300" height="150" fill="#f0f0f0"/>
    <circle cx="150" cy="90" r="30" fill="#ff6347"/>
  </svg>
</div>
"##,
};

const ENTRIES: [CatalogEntry; 3] = [CLICK_CIRCLE, CLICK_RECTANGLE, HOVER_CIRCLE];

/// All available templates, in gallery order.
#[must_use]
pub fn available() -> Vec<InteractiveSvg> {
    ENTRIES.iter().map(CatalogEntry::to_svg).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order_and_ids() {
        let ids: Vec<_> = available().into_iter().map(|t| t.external_id).collect();
        assert_eq!(ids, ["1", "2", "3"]);
    }

    #[test]
    fn test_titles() {
        let titles: Vec<_> = available().into_iter().map(|t| t.title).collect();
        assert_eq!(titles, ["Click Circle", "Click Rectangle", "Hover Circle"]);
    }

    #[test]
    fn test_previews_are_static() {
        for template in available() {
            assert!(template.svg_html.starts_with("<svg"));
            assert!(template.svg_html.contains("<script>"));
            assert!(template.preview_html.starts_with("<div"));
            assert!(!template.preview_html.contains("<script>"));
        }
    }
}
