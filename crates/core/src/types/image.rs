//! Interactive SVG image templates.

use serde::{Deserialize, Serialize};

/// An interactive SVG template that can be assigned to a theme block.
///
/// `svg_html` is the full interactive markup rendered on the storefront
/// (it may carry an inline `<script>`); `preview_html` is a static thumbnail
/// safe to show in the admin gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractiveSvg {
    /// Stable catalog identifier, unique per shop.
    pub external_id: String,
    /// Display title.
    pub title: String,
    /// Interactive markup.
    pub svg_html: String,
    /// Static preview markup.
    pub preview_html: String,
}
