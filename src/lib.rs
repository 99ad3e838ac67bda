//! Headless core of the stockpile diagram editor: the document model, grid
//! placement, persistence and the drag-and-drop controllers.

pub mod canvas;
pub mod catalog;
pub mod grid;
pub mod migrate;
pub mod model;
pub mod placement;
pub mod settings;
pub mod storage;
pub mod store;

pub use canvas::CanvasController;
pub use grid::IconScale;
pub use model::{Cell, Icon, Section, SectionIcon, Template};
pub use placement::{DragPayload, DropOutcome, SectionController};
pub use store::Store;
