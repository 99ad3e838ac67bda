//! Canvas-level coordination: one placement controller per section, drag
//! routing to the topmost section, section creation and move/resize gestures.

use crate::model::{MIN_SECTION_HEIGHT, MIN_SECTION_WIDTH, Point, Section, SectionPatch};
use crate::placement::{DragPayload, DropOutcome, RenderPlan, SectionController};
use crate::store::Store;

/// Smallest size a resize gesture can reach.
pub const MIN_SECTION_SIZE: (f32, f32) = (MIN_SECTION_WIDTH, MIN_SECTION_HEIGHT);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureKind {
    Move,
    Resize,
}

/// A section being moved or resized. Nothing is written until it ends.
#[derive(Clone, Debug, PartialEq)]
struct SectionGesture {
    section_id: String,
    kind: GestureKind,
    start: Section,
    dx: f32,
    dy: f32,
}

impl SectionGesture {
    fn patch(&self, bounds: (f32, f32)) -> SectionPatch {
        match self.kind {
            GestureKind::Move => {
                let max_x = (bounds.0 - self.start.width).max(0.0);
                let max_y = (bounds.1 - self.start.height).max(0.0);
                SectionPatch::position(Point::new(
                    (self.start.x + self.dx).clamp(0.0, max_x),
                    (self.start.y + self.dy).clamp(0.0, max_y),
                ))
            }
            GestureKind::Resize => {
                SectionPatch::size(self.start.width + self.dx, self.start.height + self.dy)
            }
        }
    }
}

pub struct CanvasController {
    width: f32,
    height: f32,
    controllers: Vec<SectionController>,
    drag: Option<DragPayload>,
    hovered: Option<String>,
    pending_section: Option<Point>,
    gesture: Option<SectionGesture>,
}

impl CanvasController {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            controllers: Vec::new(),
            drag: None,
            hovered: None,
            pending_section: None,
            gesture: None,
        }
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn controllers(&self) -> &[SectionController] {
        &self.controllers
    }

    pub fn controller(&self, section_id: &str) -> Option<&SectionController> {
        self.controllers.iter().find(|c| c.section_id() == section_id)
    }

    fn controller_mut(&mut self, section_id: &str) -> Option<&mut SectionController> {
        self.controllers
            .iter_mut()
            .find(|c| c.section_id() == section_id)
    }

    /// Creates, reuses and drops controllers so they mirror the store's
    /// section list in order. Returns the non-empty render plans.
    pub fn sync(&mut self, store: &Store) -> Vec<(String, RenderPlan)> {
        let mut previous = std::mem::take(&mut self.controllers);
        let mut plans = Vec::new();
        for section in store.sections() {
            let mut controller = match previous.iter().position(|c| c.section_id() == section.id) {
                Some(pos) => previous.swap_remove(pos),
                None => SectionController::new(section.id.clone()),
            };
            let plan = controller.sync(section, store.icon_scale());
            if !plan.is_noop() {
                plans.push((section.id.clone(), plan));
            }
            self.controllers.push(controller);
        }
        for gone in previous {
            log::debug!("dropping controller for deleted section {}", gone.section_id());
            if self.hovered.as_deref() == Some(gone.section_id()) {
                self.hovered = None;
            }
            if self
                .gesture
                .as_ref()
                .is_some_and(|g| g.section_id == gone.section_id())
            {
                self.gesture = None;
            }
        }
        plans
    }

    /// Topmost section containing `pointer`; later sections draw above earlier ones.
    pub fn section_at(&self, pointer: Point) -> Option<&str> {
        self.controllers
            .iter()
            .rev()
            .find(|c| c.section().is_some_and(|s| s.contains_point(pointer)))
            .map(|c| c.section_id())
    }

    // --- drag and drop ---

    pub fn begin_drag(&mut self, payload: DragPayload) {
        self.clear_highlights();
        self.drag = Some(payload);
    }

    pub fn drag_payload(&self) -> Option<&DragPayload> {
        self.drag.as_ref()
    }

    pub fn hovered_section(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    /// Updates highlights for the active drag. Only the section under the
    /// pointer keeps a highlight.
    pub fn hover(&mut self, pointer: Point) {
        let Some(payload) = self.drag.clone() else {
            return;
        };
        let target = self.section_at(pointer).map(str::to_string);
        if self.hovered != target {
            if let Some(prev) = self.hovered.take() {
                if let Some(c) = self.controller_mut(&prev) {
                    c.drag_leave();
                }
            }
            self.hovered = target.clone();
        }
        if let Some(id) = target {
            if let Some(c) = self.controller_mut(&id) {
                c.hover(&payload, pointer);
            }
        }
    }

    /// Ends the active drag at `pointer`, applying it to the topmost section there.
    pub fn drop(&mut self, store: &mut Store, pointer: Point) -> DropOutcome {
        let payload = self.drag.take();
        let target = self.section_at(pointer).map(str::to_string);
        self.clear_highlights();
        let (Some(payload), Some(target)) = (payload, target) else {
            log::debug!("drop at ({}, {}) has no target", pointer.x, pointer.y);
            return DropOutcome::Ignored;
        };
        match self.controller_mut(&target) {
            Some(c) => c.drop(store, &payload, pointer),
            None => DropOutcome::Ignored,
        }
    }

    /// Like [`Self::drop`] for a payload that arrives encoded.
    pub fn drop_encoded(&mut self, store: &mut Store, text: &str, pointer: Point) -> DropOutcome {
        match DragPayload::decode(text) {
            Some(payload) => {
                self.drag = Some(payload);
                self.drop(store, pointer)
            }
            None => {
                self.cancel_drag();
                DropOutcome::Ignored
            }
        }
    }

    /// Pointer left the canvas; the drag itself continues.
    pub fn drag_leave(&mut self) {
        self.clear_highlights();
    }

    pub fn cancel_drag(&mut self) {
        self.drag = None;
        self.clear_highlights();
    }

    fn clear_highlights(&mut self) {
        self.hovered = None;
        for c in &mut self.controllers {
            c.drag_end();
        }
    }

    // --- section creation ---

    /// Starts the creation gesture when `pointer` is on empty canvas.
    pub fn request_section_at(&mut self, pointer: Point) -> bool {
        if self.section_at(pointer).is_some() {
            return false;
        }
        self.pending_section = Some(pointer);
        true
    }

    /// Starts the creation gesture at `pos` whatever lies underneath.
    pub fn begin_section_at(&mut self, pos: Point) {
        self.pending_section = Some(pos);
    }

    pub fn pending_section(&self) -> Option<Point> {
        self.pending_section
    }

    pub fn confirm_section(
        &mut self,
        store: &mut Store,
        title: &str,
        color: &str,
    ) -> Option<String> {
        let pos = self.pending_section.take()?;
        let section = Section::new(title, color, pos);
        let id = section.id.clone();
        store.add_section(section);
        Some(id)
    }

    pub fn cancel_section(&mut self) {
        self.pending_section = None;
    }

    // --- move / resize ---

    pub fn begin_gesture(&mut self, section_id: &str, kind: GestureKind) -> bool {
        let Some(start) = self.controller(section_id).and_then(|c| c.section()).cloned() else {
            return false;
        };
        self.gesture = Some(SectionGesture {
            section_id: section_id.to_string(),
            kind,
            start,
            dx: 0.0,
            dy: 0.0,
        });
        true
    }

    pub fn drag_gesture(&mut self, dx: f32, dy: f32) {
        if let Some(g) = &mut self.gesture {
            g.dx += dx;
            g.dy += dy;
        }
    }

    /// Where the section would sit if the gesture ended now, as `(x, y, w, h)`.
    pub fn preview(&self, section_id: &str) -> Option<(f32, f32, f32, f32)> {
        let g = self.gesture.as_ref().filter(|g| g.section_id == section_id)?;
        let mut preview = g.start.clone();
        preview.apply(&g.patch((self.width, self.height)));
        Some((preview.x, preview.y, preview.width, preview.height))
    }

    pub fn end_gesture(&mut self, store: &mut Store) -> bool {
        let Some(g) = self.gesture.take() else {
            return false;
        };
        if g.dx == 0.0 && g.dy == 0.0 {
            return false;
        }
        store.update_section(&g.section_id, &g.patch((self.width, self.height)))
    }

    pub fn cancel_gesture(&mut self) {
        self.gesture = None;
    }

    pub fn is_gesture_active(&self) -> bool {
        self.gesture.is_some()
    }
}
