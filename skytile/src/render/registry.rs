//! Static layer-name table.

use super::catalog::CatalogRenderer;
use super::draw::DrawRenderer;
use super::grid::GridRenderer;
use super::points::PointsRenderer;
use super::solid::SolidRenderer;
use super::RendererEntry;

static REGISTRY: &[(&str, RendererEntry)] = &[
    ("solid", RendererEntry::Vector(&SolidRenderer)),
    ("grid", RendererEntry::Vector(&GridRenderer)),
    ("draw", RendererEntry::Vector(&DrawRenderer)),
    ("points", RendererEntry::Vector(&PointsRenderer)),
    ("userdot", RendererEntry::Vector(&PointsRenderer)),
    ("catalog", RendererEntry::Raster(&CatalogRenderer)),
    ("brightstars", RendererEntry::Raster(&CatalogRenderer)),
];

/// Find the renderer registered under exactly `name`.
pub fn lookup(name: &str) -> Option<RendererEntry> {
    REGISTRY
        .iter()
        .find(|(registered, _)| *registered == name)
        .map(|(_, entry)| *entry)
}

/// All registered layer names, in table order.
pub fn names() -> impl Iterator<Item = &'static str> {
    REGISTRY.iter().map(|(name, _)| *name)
}
