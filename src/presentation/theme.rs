use eframe::egui;

pub struct Palette {
    pub bg: egui::Color32,
    pub fg: egui::Color32,
    pub stroke: egui::Color32,
    pub accent: egui::Color32,
    pub accent_active: egui::Color32,
}

impl Palette {
    pub fn new(is_dark: bool) -> Self {
        if is_dark {
            Self {
                bg: egui::Color32::from_rgb(24, 26, 27),
                fg: egui::Color32::WHITE,
                stroke: egui::Color32::from_gray(220),
                accent: egui::Color32::from_rgb(70, 160, 255),
                accent_active: egui::Color32::from_rgb(0, 200, 140),
            }
        } else {
            Self {
                bg: egui::Color32::from_rgb(248, 248, 246),
                fg: egui::Color32::BLACK,
                stroke: egui::Color32::from_gray(40),
                accent: egui::Color32::from_rgb(40, 120, 235),
                accent_active: egui::Color32::from_rgb(0, 170, 110),
            }
        }
    }
}

pub fn configure_style(ctx: &egui::Context, is_dark: bool) {
    let mut style = (*ctx.style()).clone();
    let palette = Palette::new(is_dark);

    style
        .text_styles
        .iter_mut()
        .for_each(|(text_style, font_id)| {
            font_id.size = match text_style {
                egui::TextStyle::Heading => 24.0,
                egui::TextStyle::Body => 14.0,
                egui::TextStyle::Button => 14.0,
                _ => font_id.size,
            };
        });

    style.spacing.item_spacing = egui::vec2(10.0, 10.0);
    style.spacing.button_padding = egui::vec2(14.0, 8.0);

    style.visuals.widgets.noninteractive.bg_stroke = egui::Stroke::new(1.5, palette.stroke);
    style.visuals.widgets.noninteractive.bg_fill = palette.bg;
    style.visuals.widgets.noninteractive.fg_stroke = egui::Stroke::new(1.0, palette.fg);

    style.visuals.widgets.inactive.bg_stroke = egui::Stroke::new(1.5, palette.stroke);
    style.visuals.widgets.inactive.fg_stroke = egui::Stroke::new(1.0, palette.fg);
    style.visuals.widgets.inactive.bg_fill = if is_dark {
        egui::Color32::from_gray(32)
    } else {
        egui::Color32::WHITE
    };

    style.visuals.widgets.hovered.bg_fill = palette.accent;
    style.visuals.widgets.hovered.fg_stroke = egui::Stroke::new(1.0, egui::Color32::WHITE);

    style.visuals.widgets.active.bg_fill = palette.accent_active;
    style.visuals.widgets.active.fg_stroke = egui::Stroke::new(1.0, egui::Color32::BLACK);

    style.visuals.selection.bg_fill = palette.accent;
    style.visuals.panel_fill = palette.bg;
    style.visuals.dark_mode = is_dark;

    ctx.set_style(style);
}
