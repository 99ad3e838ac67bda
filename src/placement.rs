//! Per-section grid controller: layout, drag feedback and drop resolution.
//!
//! Coordinates are canvas coordinates, the same space as `Section::x`/`y`.
//! The shell converts pointer positions before calling in, so everything here
//! runs without a UI.

use serde::{Deserialize, Serialize};

use crate::grid::{self, GridSize, IconScale};
use crate::model::{Cell, Icon, IconCategory, Point, Section};
use crate::store::Store;

/// What is being dragged. The `kind` tag is chosen by whoever starts the drag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DragPayload {
    /// A catalog icon from the sidebar.
    #[serde(rename_all = "camelCase")]
    Catalog {
        id: String,
        filename: String,
        path: String,
        display_name: String,
    },
    /// An icon already placed in a section.
    #[serde(rename_all = "camelCase")]
    GridIcon {
        icon_instance_id: String,
        from_section_id: String,
    },
}

impl DragPayload {
    pub fn from_icon(icon: &Icon) -> Self {
        DragPayload::Catalog {
            id: icon.id.clone(),
            filename: icon.filename.clone(),
            path: icon.path.clone(),
            display_name: icon.display_name.clone(),
        }
    }

    pub fn is_catalog(&self) -> bool {
        matches!(self, DragPayload::Catalog { .. })
    }

    pub fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            log::warn!("failed to encode drag payload: {e}");
            String::new()
        })
    }

    /// Garbled or foreign payloads decode to `None`.
    pub fn decode(text: &str) -> Option<Self> {
        match serde_json::from_str(text) {
            Ok(payload) => Some(payload),
            Err(e) => {
                log::debug!("ignoring drag payload: {e}");
                None
            }
        }
    }
}

/// Result of a drop, mostly for the status line and tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DropOutcome {
    Added { instance_id: String, cell: Cell },
    Moved { cell: Cell },
    Transferred { cell: Cell },
    Ignored,
}

/// What a controller has to redraw after the section changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderPlan {
    pub rebuild_grid: bool,
    pub restyle: bool,
    pub retitle: bool,
}

impl RenderPlan {
    pub fn is_noop(self) -> bool {
        !(self.rebuild_grid || self.restyle || self.retitle)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacedIcon {
    pub instance_id: String,
    pub cell: Cell,
    /// False for icons whose stored cell lies past the current capacity.
    /// They are still drawn, just outside the tiled area.
    pub in_capacity: bool,
}

/// Grid cells and icon positions as last rebuilt.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GridLayout {
    pub size: Option<GridSize>,
    pub empty_cells: Vec<Cell>,
    pub icons: Vec<PlacedIcon>,
}

impl GridLayout {
    fn build(section: &Section, scale: IconScale) -> Self {
        let size = grid::grid_dimensions(scale, section.width, section.height);
        let occupied = section.occupied_cells();
        Self {
            size: Some(size),
            empty_cells: size.cells().filter(|c| !occupied.contains(c)).collect(),
            icons: section
                .icons
                .iter()
                .map(|icon| PlacedIcon {
                    instance_id: icon.id.clone(),
                    cell: icon.cell(),
                    in_capacity: size.contains(icon.cell()),
                })
                .collect(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Highlight {
    pub cell: Option<Cell>,
    pub section: bool,
}

#[derive(Clone, Debug)]
struct Rendered {
    section: Section,
    scale: IconScale,
}

pub struct SectionController {
    section_id: String,
    rendered: Option<Rendered>,
    layout: GridLayout,
    highlight: Highlight,
}

impl SectionController {
    pub fn new(section_id: impl Into<String>) -> Self {
        Self {
            section_id: section_id.into(),
            rendered: None,
            layout: GridLayout::default(),
            highlight: Highlight::default(),
        }
    }

    pub fn section_id(&self) -> &str {
        &self.section_id
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn highlight(&self) -> Highlight {
        self.highlight
    }

    /// The section as of the last `sync`.
    pub fn section(&self) -> Option<&Section> {
        self.rendered.as_ref().map(|r| &r.section)
    }

    /// Brings the controller up to date with `section` and says what changed.
    pub fn sync(&mut self, section: &Section, scale: IconScale) -> RenderPlan {
        let plan = match &self.rendered {
            None => RenderPlan {
                rebuild_grid: true,
                restyle: true,
                retitle: true,
            },
            Some(prev) => RenderPlan {
                rebuild_grid: prev.scale != scale
                    || grid::grid_dimensions(prev.scale, prev.section.width, prev.section.height)
                        != grid::grid_dimensions(scale, section.width, section.height)
                    || icons_changed(&prev.section, section),
                restyle: prev.section.x != section.x
                    || prev.section.y != section.y
                    || prev.section.width != section.width
                    || prev.section.height != section.height,
                retitle: prev.section.title != section.title || prev.section.color != section.color,
            },
        };
        if plan.rebuild_grid {
            self.layout = GridLayout::build(section, scale);
        }
        if !plan.is_noop() {
            self.rendered = Some(Rendered {
                section: section.clone(),
                scale,
            });
        }
        plan
    }

    fn scale(&self) -> IconScale {
        self.rendered.as_ref().map(|r| r.scale).unwrap_or_default()
    }

    pub fn grid_origin(&self) -> Option<Point> {
        self.section()
            .map(|s| grid::grid_origin(Point::new(s.x, s.y)))
    }

    /// Cell under `pointer`, limited to the visible capacity.
    pub fn target_cell(&self, pointer: Point) -> Option<Cell> {
        let origin = self.grid_origin()?;
        let size = self.layout.size?;
        let cell = grid::pixel_to_cell(self.scale(), pointer, origin);
        Some(Cell::new(
            cell.row.min(size.rows.saturating_sub(1)),
            cell.col.min(size.cols.saturating_sub(1)),
        ))
    }

    /// Placed icon drawn under `pointer`, if any.
    pub fn icon_at(&self, pointer: Point) -> Option<&str> {
        let origin = self.grid_origin()?;
        let cell = grid::pixel_to_cell(self.scale(), pointer, origin);
        if pointer.x < origin.x || pointer.y < origin.y {
            return None;
        }
        self.layout
            .icons
            .iter()
            .find(|p| p.cell == cell)
            .map(|p| p.instance_id.as_str())
    }

    /// Payload for dragging one of this section's icons.
    pub fn begin_drag(&self, instance_id: &str) -> Option<DragPayload> {
        self.layout
            .icons
            .iter()
            .any(|p| p.instance_id == instance_id)
            .then(|| DragPayload::GridIcon {
                icon_instance_id: instance_id.to_string(),
                from_section_id: self.section_id.clone(),
            })
    }

    /// Moves the cell highlight under the pointer; catalog drags also light
    /// up the whole section.
    pub fn hover(&mut self, payload: &DragPayload, pointer: Point) -> Option<Cell> {
        let cell = self.target_cell(pointer);
        self.highlight = Highlight {
            cell,
            section: payload.is_catalog(),
        };
        cell
    }

    pub fn drag_leave(&mut self) {
        self.highlight = Highlight::default();
    }

    pub fn drag_end(&mut self) {
        self.highlight = Highlight::default();
    }

    /// Resolves a drop at `pointer` into a store mutation.
    pub fn drop(
        &mut self,
        store: &mut Store,
        payload: &DragPayload,
        pointer: Point,
    ) -> DropOutcome {
        self.highlight = Highlight::default();
        let Some(cell) = self.target_cell(pointer) else {
            log::debug!("drop on unsynced section {}", self.section_id);
            return DropOutcome::Ignored;
        };
        match payload {
            DragPayload::Catalog {
                id,
                filename,
                path,
                display_name,
            } => {
                let icon = store
                    .icons()
                    .iter()
                    .find(|i| i.id == *id)
                    .cloned()
                    .unwrap_or_else(|| Icon {
                        id: id.clone(),
                        filename: filename.clone(),
                        display_name: display_name.clone(),
                        category: IconCategory::FALLBACK,
                        path: path.clone(),
                    });
                match store.add_icon_to_section(&self.section_id, &icon, Some(cell)) {
                    Some(instance_id) => {
                        let cell = store
                            .section(&self.section_id)
                            .and_then(|s| s.icon(&instance_id))
                            .map(|i| i.cell())
                            .unwrap_or(cell);
                        DropOutcome::Added { instance_id, cell }
                    }
                    None => DropOutcome::Ignored,
                }
            }
            DragPayload::GridIcon {
                icon_instance_id,
                from_section_id,
            } if *from_section_id == self.section_id => {
                if store.move_icon_to_grid_position(&self.section_id, icon_instance_id, cell) {
                    DropOutcome::Moved { cell }
                } else {
                    DropOutcome::Ignored
                }
            }
            DragPayload::GridIcon {
                icon_instance_id,
                from_section_id,
            } => {
                if store.move_icon_between_sections(
                    from_section_id,
                    &self.section_id,
                    icon_instance_id,
                    cell,
                ) {
                    DropOutcome::Transferred { cell }
                } else {
                    DropOutcome::Ignored
                }
            }
        }
    }

    /// Same as [`Self::drop`] for a payload still in its encoded form.
    pub fn drop_encoded(&mut self, store: &mut Store, text: &str, pointer: Point) -> DropOutcome {
        match DragPayload::decode(text) {
            Some(payload) => self.drop(store, &payload, pointer),
            None => {
                self.drag_end();
                DropOutcome::Ignored
            }
        }
    }
}

fn icons_changed(prev: &Section, next: &Section) -> bool {
    prev.icons.len() != next.icons.len()
        || prev.icons.iter().zip(&next.icons).any(|(a, b)| {
            a.id != b.id
                || a.cell() != b.cell()
                || a.subtype != b.subtype
                || a.quantity != b.quantity
        })
}
