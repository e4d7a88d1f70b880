// crates/clipmill-ui/src/theme.rs
use egui::{Color32, Context, Stroke, Style, Visuals};

// ── Palette ──────────────────────────────────────────────────────────────────
// Light theme: white cards over a pale blue shell.
pub const ACCENT:       Color32 = Color32::from_rgb(  0, 123, 255);
pub const ACCENT_DARK:  Color32 = Color32::from_rgb(  0,  86, 179);
pub const ACCENT_HOVER: Color32 = Color32::from_rgb(  0, 105, 217);
pub const EXEC_GREEN:   Color32 = Color32::from_rgb( 40, 167,  69);

pub const SHELL_BG:     Color32 = Color32::from_rgb(234, 246, 255);
pub const CARD_BG:      Color32 = Color32::from_rgb(255, 255, 255);
pub const FIELD_BG:     Color32 = Color32::from_rgb(248, 251, 255);

pub const TEXT:         Color32 = Color32::from_rgb( 28,  28,  28);
pub const TEXT_DIM:     Color32 = Color32::from_rgb(108, 117, 125);
pub const BORDER:       Color32 = Color32::from_rgb(197, 219, 234);

pub fn configure_style(ctx: &Context) {
    let mut style = Style::default();

    style.spacing.item_spacing   = egui::vec2(6.0, 6.0);
    style.spacing.window_margin  = egui::Margin::same(10);
    style.spacing.button_padding = egui::vec2(12.0, 6.0);
    style.spacing.indent         = 12.0;

    let cr = egui::CornerRadius::same(5);

    let mut v = Visuals::light();
    v.panel_fill       = SHELL_BG;
    v.window_fill      = CARD_BG;
    v.faint_bg_color   = FIELD_BG;
    v.extreme_bg_color = CARD_BG;
    v.window_stroke    = Stroke::new(1.0, BORDER);

    v.selection.bg_fill = ACCENT;
    v.selection.stroke  = Stroke::new(1.0, Color32::WHITE);
    v.hyperlink_color   = ACCENT_HOVER;

    v.widgets.noninteractive.bg_fill       = CARD_BG;
    v.widgets.noninteractive.bg_stroke     = Stroke::new(1.0, BORDER);
    v.widgets.noninteractive.fg_stroke     = Stroke::new(1.0, TEXT);
    v.widgets.noninteractive.corner_radius = cr;

    v.widgets.inactive.bg_fill       = FIELD_BG;
    v.widgets.inactive.bg_stroke     = Stroke::new(1.0, BORDER);
    v.widgets.inactive.fg_stroke     = Stroke::new(1.0, TEXT);
    v.widgets.inactive.corner_radius = cr;

    v.widgets.hovered.bg_fill       = Color32::from_rgb(222, 238, 252);
    v.widgets.hovered.bg_stroke     = Stroke::new(1.0, ACCENT);
    v.widgets.hovered.fg_stroke     = Stroke::new(1.5, ACCENT_DARK);
    v.widgets.hovered.corner_radius = cr;

    v.widgets.active.bg_fill       = ACCENT;
    v.widgets.active.bg_stroke     = Stroke::new(1.0, ACCENT_DARK);
    v.widgets.active.fg_stroke     = Stroke::new(2.0, Color32::WHITE);
    v.widgets.active.corner_radius = cr;

    v.widgets.open.bg_fill       = Color32::from_rgb(222, 238, 252);
    v.widgets.open.bg_stroke     = Stroke::new(1.0, ACCENT);
    v.widgets.open.fg_stroke     = Stroke::new(1.5, ACCENT_DARK);
    v.widgets.open.corner_radius = cr;

    v.override_text_color = Some(TEXT);

    ctx.set_visuals(v);
    ctx.set_style(style);

    ctx.style_mut(|s| {
        s.visuals.window_corner_radius = cr;
        s.visuals.menu_corner_radius   = cr;
    });
}
