use eframe::egui;
use stockpiler::grid::{self, IconScale, SECTION_HEADER_HEIGHT};
use stockpiler::model::{self, Cell, Point, QuantityBadge};

use super::SectionModal;

pub(super) const RESIZE_HANDLE: f32 = 12.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum ModalResult {
    Open,
    Confirm,
    Cancel,
}

pub(super) fn to_screen(origin: egui::Pos2, p: Point) -> egui::Pos2 {
    origin + p.to_pos2().to_vec2()
}

pub(super) fn to_canvas(origin: egui::Pos2, p: egui::Pos2) -> Point {
    Point::from_pos2((p - origin).to_pos2())
}

pub(super) fn section_color(hex: &str) -> egui::Color32 {
    model::parse_hex_color(hex).unwrap_or(egui::Color32::from_gray(120))
}

pub(super) fn draw_background(painter: &egui::Painter, rect: egui::Rect) {
    let bg = painter.ctx().style().visuals.extreme_bg_color;
    painter.rect_filled(rect, 0.0, bg);
    let grid_color = egui::Color32::from_gray(45);
    let spacing = 40.0;
    let mut x = rect.min.x;
    while x < rect.max.x {
        painter.line_segment(
            [egui::pos2(x, rect.min.y), egui::pos2(x, rect.max.y)],
            egui::Stroke::new(1.0, grid_color),
        );
        x += spacing;
    }
    let mut y = rect.min.y;
    while y < rect.max.y {
        painter.line_segment(
            [egui::pos2(rect.min.x, y), egui::pos2(rect.max.x, y)],
            egui::Stroke::new(1.0, grid_color),
        );
        y += spacing;
    }
}

/// Frame, header band and title of one section.
pub(super) fn draw_section_frame(
    painter: &egui::Painter,
    rect: egui::Rect,
    title: &str,
    color: egui::Color32,
    highlighted: bool,
) {
    painter.rect_filled(rect, 4.0, color.gamma_multiply(0.18));
    let header =
        egui::Rect::from_min_size(rect.min, egui::vec2(rect.width(), SECTION_HEADER_HEIGHT));
    painter.rect_filled(header, 4.0, color.gamma_multiply(0.85));
    painter.text(
        header.left_center() + egui::vec2(10.0, 0.0),
        egui::Align2::LEFT_CENTER,
        title,
        egui::FontId::proportional(15.0),
        egui::Color32::WHITE,
    );
    let stroke = if highlighted {
        egui::Stroke::new(3.0, egui::Color32::from_rgb(250, 210, 90))
    } else {
        egui::Stroke::new(2.0, color)
    };
    painter.rect_stroke(rect, 4.0, stroke, egui::StrokeKind::Inside);

    let handle =
        egui::Rect::from_min_max(rect.max - egui::vec2(RESIZE_HANDLE, RESIZE_HANDLE), rect.max);
    painter.line_segment([handle.left_bottom(), handle.right_top()], egui::Stroke::new(1.5, color));
    painter.line_segment(
        [handle.center_bottom(), handle.right_center()],
        egui::Stroke::new(1.5, color),
    );
}

/// Screen rect of the icon slot centered inside `cell`.
pub(super) fn slot_rect(
    origin: egui::Pos2,
    section_pos: Point,
    scale: IconScale,
    cell: Cell,
) -> egui::Rect {
    let metrics = scale.metrics();
    let grid_origin = grid::grid_origin(section_pos);
    let offset = grid::cell_offset(scale, cell);
    let inset = (metrics.cell - metrics.icon) / 2.0;
    let min = to_screen(
        origin,
        Point::new(grid_origin.x + offset.x + inset, grid_origin.y + offset.y + inset),
    );
    egui::Rect::from_min_size(min, egui::vec2(metrics.icon, metrics.icon))
}

pub(super) fn draw_empty_cell(painter: &egui::Painter, rect: egui::Rect, highlighted: bool) {
    if highlighted {
        painter.rect_filled(rect, 3.0, egui::Color32::from_rgba_unmultiplied(250, 210, 90, 60));
        painter.rect_stroke(
            rect,
            3.0,
            egui::Stroke::new(2.0, egui::Color32::from_rgb(250, 210, 90)),
            egui::StrokeKind::Inside,
        );
    } else {
        painter.rect_stroke(
            rect,
            3.0,
            egui::Stroke::new(1.0, egui::Color32::from_white_alpha(25)),
            egui::StrokeKind::Inside,
        );
    }
}

/// One placed icon with its subtype marker and quantity badge.
pub(super) fn draw_icon_slot(
    painter: &egui::Painter,
    rect: egui::Rect,
    scale: IconScale,
    icon: Option<&egui::TextureHandle>,
    subtype: Option<&egui::TextureHandle>,
    badge: QuantityBadge,
    highlighted: bool,
) {
    let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
    painter.rect_filled(rect, 3.0, egui::Color32::from_black_alpha(90));
    let img = scale.metrics().img;
    let img_rect = egui::Rect::from_center_size(rect.center(), egui::vec2(img, img));
    match icon {
        Some(texture) => {
            painter.image(texture.id(), img_rect, uv, egui::Color32::WHITE);
        }
        None => {
            painter.rect_stroke(
                img_rect,
                2.0,
                egui::Stroke::new(1.0, egui::Color32::from_gray(140)),
                egui::StrokeKind::Inside,
            );
        }
    }
    if let Some(texture) = subtype {
        let side = rect.width() * 0.4;
        let sub_rect = egui::Rect::from_min_size(rect.min, egui::vec2(side, side));
        painter.image(texture.id(), sub_rect, uv, egui::Color32::WHITE);
    }
    if let Some(text) = badge.text() {
        let font = egui::FontId::proportional((rect.width() * 0.26).max(10.0));
        let galley = painter.layout_no_wrap(text, font, egui::Color32::WHITE);
        let size = galley.size() + egui::vec2(6.0, 2.0);
        let badge_rect = egui::Rect::from_min_size(rect.max - size, size);
        let fill = match badge {
            QuantityBadge::NotNeeded => egui::Color32::from_rgb(39, 174, 96),
            QuantityBadge::Unspecified => egui::Color32::from_rgb(230, 126, 34),
            _ => egui::Color32::from_rgb(30, 30, 30),
        };
        painter.rect_filled(badge_rect, 3.0, fill);
        painter.galley(badge_rect.min + egui::vec2(3.0, 1.0), galley, egui::Color32::WHITE);
    }
    if highlighted {
        painter.rect_stroke(
            rect,
            3.0,
            egui::Stroke::new(2.0, egui::Color32::from_rgb(250, 210, 90)),
            egui::StrokeKind::Inside,
        );
    }
}

pub(super) fn section_modal_ui(ctx: &egui::Context, modal: &mut SectionModal) -> ModalResult {
    let mut result = ModalResult::Open;
    let heading = match modal.target {
        super::ModalTarget::Create => "New section",
        super::ModalTarget::Edit(_) => "Edit section",
    };
    egui::Window::new(heading)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
        .show(ctx, |ui| {
            ui.label("Title");
            let edit = ui.text_edit_singleline(&mut modal.title);
            if edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                result = ModalResult::Confirm;
            }
            ui.add_space(6.0);
            ui.label("Color");
            egui::Grid::new("section_palette").spacing([4.0, 4.0]).show(ui, |ui| {
                for (i, hex) in model::SECTION_COLORS.iter().enumerate() {
                    let mut button = egui::Button::new("").fill(section_color(hex));
                    if modal.color.eq_ignore_ascii_case(hex) {
                        button = button.stroke(egui::Stroke::new(2.0, egui::Color32::WHITE));
                    }
                    if ui.add_sized([22.0, 22.0], button).clicked() {
                        modal.color = hex.to_string();
                    }
                    if i % 8 == 7 {
                        ui.end_row();
                    }
                }
            });
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("OK").clicked() {
                    result = ModalResult::Confirm;
                }
                if ui.button("Cancel").clicked() {
                    result = ModalResult::Cancel;
                }
            });
        });
    result
}

pub(super) fn confirm_clear_ui(ctx: &egui::Context) -> ModalResult {
    let mut result = ModalResult::Open;
    egui::Window::new("Clear document")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
        .show(ctx, |ui| {
            ui.label("Delete every section?");
            ui.horizontal(|ui| {
                if ui.button("Clear").clicked() {
                    result = ModalResult::Confirm;
                }
                if ui.button("Cancel").clicked() {
                    result = ModalResult::Cancel;
                }
            });
        });
    result
}
