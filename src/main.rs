use eframe::egui;
use std::path::Path;

use mediamap::chart::{FILL_OPACITY, FONT_SIZE};
use mediamap::cli::{parse_args, Args, DatasetEntry};
use mediamap::svg::render_svg;
use mediamap::text_fit::DeterministicTextMeasure;
use mediamap::{ClickOutcome, Error, RenderOptions, TreemapChart};

fn main() {
    env_logger::init();

    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(Error::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };
    let options = match args.render_options() {
        Ok(v) => v,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    if let Some(out) = &args.export_svg {
        if let Err(err) = export_svg(&args, options, out) {
            eprintln!("{err}");
            std::process::exit(1);
        }
        return;
    }

    if let Err(err) = run_gui(args, options) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

/// Render the first dataset at its final frame and write it to `out`.
fn export_svg(args: &Args, options: RenderOptions, out: &Path) -> mediamap::Result<()> {
    let data = args
        .datasets
        .first()
        .map(|path| mediamap::Dataset::load(path))
        .transpose()?;
    let chart = TreemapChart::render(
        data.as_ref(),
        options.with_play_animation(false),
        &DeterministicTextMeasure::default(),
        0.0,
    )?;
    std::fs::write(out, render_svg(&chart, 0.0)).map_err(|source| Error::Io {
        path: out.to_path_buf(),
        source,
    })?;
    log::info!("Wrote {} groups to {}", chart.leaves().len(), out.display());
    Ok(())
}

fn run_gui(args: Args, options: RenderOptions) -> Result<(), eframe::Error> {
    let native = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 900.0])
            .with_title("MediaMap - Query Media Treemap"),
        ..Default::default()
    };

    let datasets = args.datasets.into_iter().map(DatasetEntry::new).collect();
    eframe::run_native(
        "MediaMap",
        native,
        Box::new(move |cc| {
            configure_custom_style(&cc.egui_ctx);
            Box::new(MediaMapApp::new(datasets, options))
        }),
    )
}

fn configure_custom_style(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();

    // Chart colors are tuned for a light page
    let mut visuals = egui::Visuals::light();
    visuals.panel_fill = egui::Color32::WHITE;
    visuals.window_stroke = egui::Stroke::new(1.0, egui::Color32::from_gray(200));
    visuals.window_rounding = egui::Rounding::same(8.0);
    visuals.widgets.inactive.rounding = egui::Rounding::same(4.0);
    visuals.widgets.hovered.rounding = egui::Rounding::same(4.0);
    visuals.widgets.active.rounding = egui::Rounding::same(4.0);
    visuals.window_shadow = egui::epaint::Shadow::NONE;
    style.visuals = visuals;

    style.spacing.item_spacing = egui::vec2(12.0, 8.0);
    style.spacing.button_padding = egui::vec2(16.0, 6.0);

    ctx.set_style(style);
}

struct MediaMapApp {
    datasets: Vec<DatasetEntry>,
    selected: Option<usize>,
    options: RenderOptions,
    chart: Option<TreemapChart>,
    notice: Option<String>,
}

impl MediaMapApp {
    fn new(datasets: Vec<DatasetEntry>, options: RenderOptions) -> Self {
        Self {
            selected: if datasets.is_empty() { None } else { Some(0) },
            datasets,
            options,
            chart: None,
            notice: None,
        }
    }

    /// Load the picked dataset and replace whatever was drawn before.
    fn visualize(&mut self, ctx: &egui::Context) {
        let now = ctx.input(|i| i.time);
        let data = match self.selected.and_then(|i| self.datasets.get(i)) {
            Some(entry) => match entry.load() {
                Ok(data) => Some(data),
                Err(err) => {
                    log::warn!("{err}");
                    self.notice = Some(err.to_string());
                    return;
                }
            },
            None => None,
        };

        let measure = |text: &str| {
            ctx.fonts(|f| {
                f.layout_no_wrap(
                    text.to_string(),
                    egui::FontId::proportional(FONT_SIZE),
                    egui::Color32::BLACK,
                )
                .size()
                .x
            })
        };

        match TreemapChart::render(data.as_ref(), self.options.clone(), &measure, now) {
            Ok(chart) => {
                log::info!("Visualizing {} documents", chart.documents().len());
                self.chart = Some(chart);
            }
            Err(err) => {
                log::warn!("{err}");
                self.notice = Some(err.to_string());
            }
        }
    }

    fn draw_chart(ui: &mut egui::Ui, chart: &mut TreemapChart, now: f64) {
        let size = egui::vec2(chart.width(), chart.height());
        let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click());
        let painter = ui.painter_at(rect);
        let offset = rect.min.to_vec2();

        let frame = chart.frame(now);
        for lf in &frame.leaves {
            painter.rect(
                lf.rect.translate(offset),
                0.0,
                lf.leaf.fill.gamma_multiply(FILL_OPACITY),
                egui::Stroke::new(1.0, lf.leaf.group_color),
            );
            if lf.label_opacity > 0.0 && !lf.leaf.label.is_empty() {
                painter.text(
                    lf.label_pos + offset,
                    egui::Align2::CENTER_CENTER,
                    &lf.leaf.label,
                    egui::FontId::proportional(lf.font_size),
                    egui::Color32::BLACK.gamma_multiply(lf.label_opacity),
                );
            }
        }

        let ctx = ui.ctx().clone();
        let page_pos = ctx.input(|i| i.pointer.hover_pos()).unwrap_or(egui::Pos2::ZERO);
        let viewport = ctx.screen_rect().size();
        let canvas_pos = response.hover_pos().map(|p| p - offset);
        chart.pointer_moved(canvas_pos, page_pos, viewport, now);
        if chart.hovered().is_some() {
            ctx.set_cursor_icon(egui::CursorIcon::PointingHand);
        }

        if response.clicked() {
            let outcome = response
                .interact_pointer_pos()
                .and_then(|p| chart.click(p - offset, now));
            match outcome {
                Some(ClickOutcome::OpenLink(url)) if !url.is_empty() => {
                    log::info!("Opening {url}");
                    ctx.open_url(egui::OpenUrl::new_tab(url));
                }
                Some(ClickOutcome::OpenLink(_)) => log::warn!("Clicked document has no link"),
                Some(ClickOutcome::Handled) | None => {}
            }
        }
    }

    fn draw_tooltip(ctx: &egui::Context, chart: &mut TreemapChart, now: f64) {
        let tooltip = chart.tooltip();
        if !tooltip.is_displayed() {
            return;
        }
        let opacity = tooltip.opacity(now);
        let style = *tooltip.style();
        let content = tooltip.content().clone();

        let shown = egui::Area::new(egui::Id::new("document_tooltip"))
            .order(egui::Order::Tooltip)
            .fixed_pos(tooltip.position())
            .interactable(false)
            .show(ctx, |ui| {
                egui::Frame::none()
                    .fill(style.background.gamma_multiply(opacity))
                    .stroke(egui::Stroke::new(
                        style.border_width,
                        style.border.gamma_multiply(opacity),
                    ))
                    .rounding(style.rounding)
                    .inner_margin(style.padding)
                    .show(ui, |ui| {
                        ui.set_width(style.width - 2.0 * style.padding);
                        let text = style.text.gamma_multiply(opacity);
                        ui.label(egui::RichText::new(&content.heading).strong().color(text));
                        if !content.body.is_empty() {
                            ui.label(egui::RichText::new(&content.body).color(text));
                        }
                        ui.separator();
                        for (name, value) in &content.rows {
                            ui.label(egui::RichText::new(format!("{name}: {value}")).color(text));
                        }
                    });
            });

        chart.tooltip_mut().set_size(shown.response.rect.size());
    }

    fn draw_notice(&mut self, ctx: &egui::Context) {
        let Some(message) = &self.notice else {
            return;
        };
        let mut dismissed = false;
        egui::Window::new("Notice")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(message.as_str());
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });
        if dismissed {
            self.notice = None;
        }
    }
}

impl eframe::App for MediaMapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = ctx.input(|i| i.time);
        let mut visualize = false;

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("MediaMap");
                ui.separator();

                let current = self
                    .selected
                    .and_then(|i| self.datasets.get(i))
                    .map_or("Select a dataset", |d| d.name.as_str())
                    .to_string();
                egui::ComboBox::from_id_source("dataset")
                    .selected_text(current)
                    .show_ui(ui, |ui| {
                        for (i, entry) in self.datasets.iter().enumerate() {
                            ui.selectable_value(&mut self.selected, Some(i), entry.name.as_str());
                        }
                    });

                visualize = ui.button("Visualize").clicked();

                if let Some(chart) = &self.chart {
                    ui.label(format!("Documents: {}", chart.documents().len()));
                }
            });
        });

        if visualize {
            self.visualize(ctx);
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(chart) = self.chart.as_mut() else {
                ui.centered_and_justified(|ui| {
                    ui.label("Pick a dataset and press Visualize");
                });
                return;
            };
            egui::ScrollArea::both().show(ui, |ui| {
                Self::draw_chart(ui, chart, now);
            });
        });

        if let Some(chart) = self.chart.as_mut() {
            chart.update(now);
            Self::draw_tooltip(ctx, chart, now);
            if chart.needs_repaint(now) {
                ctx.request_repaint();
            }
        }

        self.draw_notice(ctx);
    }
}
