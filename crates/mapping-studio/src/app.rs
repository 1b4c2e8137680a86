use crate::actions::Action;
use crate::graph_view::EditorGraphView;
use crate::layout_grid::{self, LayoutStateGrid};
use crate::state::State;
use eframe::egui;
use egui_extras::{Column, TableBuilder};
use egui_graphs::{
    MetadataFrame, SettingsInteraction, SettingsNavigation, SettingsStyle, reset_layout,
};
use mapping_model::{Category, Role};

// UI Constants
const DRAG_THRESHOLD: f32 = 2.0;
const EDGE_PREVIEW_STROKE_WIDTH: f32 = 2.0;
const EDGE_PREVIEW_COLOR: egui::Color32 = egui::Color32::from_rgb(100, 100, 255);

/// Palette form buffers; purely visual state that never reaches the store.
struct PaletteForm {
    category: Category,
    role: Role,
    label: String,
    pset: String,
    filter_label: String,
}

impl Default for PaletteForm {
    fn default() -> Self {
        Self {
            category: Category::PropertySet,
            role: Role::Source,
            label: String::new(),
            pset: String::new(),
            filter_label: String::new(),
        }
    }
}

pub struct App {
    pub state: State,
    form: PaletteForm,
}

impl App {
    pub fn new(state: State) -> Self {
        Self {
            state,
            form: PaletteForm::default(),
        }
    }

    /// Drain events from a running transformation into actions.
    #[cfg(not(target_arch = "wasm32"))]
    fn poll_engine(&mut self) {
        let Some(handle) = &self.state.store.engine else {
            return;
        };
        for event in handle.poll() {
            self.state.dispatch(Action::Engine { event });
        }
    }

    // Drag-to-create edge workflow: click on source node, drag to target
    // node, release to connect. Returns arrow coordinates for preview
    // drawing during drag.
    fn handle_connection_drag(
        &mut self,
        pointer: &egui::PointerState,
    ) -> Option<(egui::Pos2, egui::Pos2)> {
        // Start potential drag from a node
        if pointer.primary_pressed()
            && let Some(hovered) = self.state.store.graph.hovered_node()
            && let Some(press_pos) = pointer.interact_pos()
        {
            self.state.dispatch(Action::SetDraggingFrom {
                node_idx: Some(hovered),
                position: Some(press_pos),
            });
            self.state.dispatch(Action::SetDragStarted { started: false });
        }

        // Detect if mouse has moved (drag started)
        if pointer.primary_down()
            && self.state.store.dragging_from.is_some()
            && pointer.delta().length() > DRAG_THRESHOLD
        {
            self.state.dispatch(Action::SetDragStarted { started: true });
        }

        // Determine if preview arrow should be drawn
        let arrow_coords = if self.state.store.drag_started {
            if let Some((_src_idx, from_pos)) = self.state.store.dragging_from {
                pointer.hover_pos().map(|to_pos| (from_pos, to_pos))
            } else {
                None
            }
        } else {
            None
        };

        // Handle mouse release - connect if dragged onto another node
        if pointer.primary_released() {
            if let Some((origin, _pos)) = self.state.store.dragging_from
                && self.state.store.drag_started
                && let Some(dest) = self.state.store.graph.hovered_node()
                && origin != dest
            {
                self.state.dispatch(Action::Connect { origin, dest });
            }
            self.state.dispatch(Action::SetDraggingFrom {
                node_idx: None,
                position: None,
            });
            self.state.dispatch(Action::SetDragStarted { started: false });
        }

        arrow_coords
    }

    // Two-click edge deletion: first click selects, second click deletes.
    fn handle_edge_deletion(&mut self, pointer: &egui::PointerState) {
        if pointer.primary_clicked() && self.state.store.dragging_from.is_none() {
            let selected_edges: Vec<_> = self.state.store.graph.selected_edges().to_vec();

            // An already-selected edge clicked again is deleted; selection
            // itself is handled by the graph library.
            if selected_edges.len() == 1 {
                self.state.dispatch(Action::DeleteSelection);
            }
        }
    }

    // Synchronous file dialogs are unavailable in the browser; the wasm
    // build ships without the file menu.
    #[cfg(target_arch = "wasm32")]
    fn menu_bar(&mut self, _ctx: &egui::Context) {}

    #[cfg(not(target_arch = "wasm32"))]
    fn menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Save Project").clicked() {
                        ui.close();
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("JSON", &["json"])
                            .save_file()
                        {
                            self.state.dispatch(Action::SaveProject { path });
                        }
                    }

                    if ui.button("Load Project").clicked() {
                        ui.close();
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("JSON", &["json"])
                            .pick_file()
                        {
                            self.state.dispatch(Action::LoadProject { path });
                        }
                    }

                    ui.separator();

                    if ui.button("Export Mapping").clicked() {
                        ui.close();
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("JSON", &["json"])
                            .save_file()
                        {
                            self.state.dispatch(Action::ExportConfig { path });
                        }
                    }

                    if ui.button("Import Mapping").clicked() {
                        ui.close();
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("JSON", &["json"])
                            .pick_file()
                        {
                            self.state.dispatch(Action::ImportConfig { path });
                        }
                    }
                });

                ui.menu_button("Transform", |ui| {
                    let running = self.state.store.processing;
                    if ui
                        .add_enabled(!running, egui::Button::new("Run on Model"))
                        .clicked()
                    {
                        ui.close();
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("IFC", &["ifc"])
                            .pick_file()
                        {
                            self.state.dispatch(Action::StartTransform { input: path });
                        }
                    }
                });
            });
        });
    }

    fn palette_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("palette_panel")
            .default_width(260.0)
            .frame(egui::Frame::side_top_panel(&ctx.style()).inner_margin(8.0))
            .show(ctx, |ui| {
                ui.vertical(|ui| {
                    ui.heading("Palette");
                    ui.separator();

                    self.custom_node_form(ui);
                    ui.separator();
                    self.filter_form(ui);
                    ui.separator();
                    self.selected_filter_classes(ui);
                    ui.separator();

                    ui.heading("Mappings");
                    self.mapping_table(ui);

                    // Progress and status at bottom
                    ui.with_layout(egui::Layout::bottom_up(egui::Align::LEFT), |ui| {
                        if let Some((percent, message)) = self.state.store.progress.clone() {
                            ui.add(
                                egui::ProgressBar::new(percent as f32 / 100.0)
                                    .text(format!("{percent}% {message}")),
                            );
                        }
                        if let Some(output) = self.state.store.last_output.clone() {
                            ui.label(format!("Last output: {output}"));
                        }
                        if let Some(status) = self.state.store.status_message.clone() {
                            ui.horizontal(|ui| {
                                ui.label(&status);
                                if ui.small_button("✕").clicked() {
                                    self.state.dispatch(Action::ClearStatusMessage);
                                }
                            });
                        }
                        ui.separator();
                    });
                });
            });
    }

    fn custom_node_form(&mut self, ui: &mut egui::Ui) {
        ui.label("New node");

        egui::ComboBox::from_id_salt("custom_category")
            .selected_text(self.form.category.title())
            .show_ui(ui, |ui| {
                for c in Category::ALL {
                    ui.selectable_value(&mut self.form.category, c, c.title());
                }
            });

        egui::ComboBox::from_id_salt("custom_role")
            .selected_text(match self.form.role {
                Role::Source => "Source",
                Role::Target => "Target",
            })
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut self.form.role, Role::Source, "Source");
                ui.selectable_value(&mut self.form.role, Role::Target, "Target");
            });

        ui.horizontal(|ui| {
            ui.label("Name");
            ui.text_edit_singleline(&mut self.form.label);
        });

        let wants_pset =
            self.form.category == Category::Property && self.form.role == Role::Source;
        if wants_pset {
            ui.horizontal(|ui| {
                ui.label("Pset");
                ui.text_edit_singleline(&mut self.form.pset);
            });
        }

        if ui.button("Add Node").clicked() {
            let pset = if wants_pset && !self.form.pset.trim().is_empty() {
                Some(self.form.pset.trim().to_string())
            } else {
                None
            };
            self.state.dispatch(Action::AddCustomNode {
                role: self.form.role,
                category: self.form.category,
                label: self.form.label.clone(),
                pset,
            });
            self.form.label.clear();
            self.form.pset.clear();
        }
    }

    fn filter_form(&mut self, ui: &mut egui::Ui) {
        ui.label("Class filter");
        ui.horizontal(|ui| {
            ui.label("Name");
            ui.text_edit_singleline(&mut self.form.filter_label);
        });
        if ui.button("Add Filter").clicked() {
            self.state.dispatch(Action::AddFilterNode {
                label: self.form.filter_label.clone(),
            });
            self.form.filter_label.clear();
        }
    }

    /// Checkbox list for the selected filter node's entity classes.
    fn selected_filter_classes(&mut self, ui: &mut egui::Ui) {
        let selected_filter = self
            .state
            .store
            .graph
            .nodes_iter()
            .find(|(_, n)| n.selected() && n.payload().is_filter())
            .map(|(idx, n)| (idx, n.payload().attrs.selected_classes.clone()));

        let Some((node_idx, classes)) = selected_filter else {
            ui.label("Select a filter node to pick classes");
            return;
        };

        ui.label("Filter classes");
        let all_classes = self.state.store.catalog.ifc_classes.clone();
        egui::ScrollArea::vertical()
            .max_height(150.0)
            .show(ui, |ui| {
                for class in &all_classes {
                    let mut checked = classes.contains(class);
                    if ui.checkbox(&mut checked, class).changed() {
                        let mut next = classes.clone();
                        if checked {
                            next.push(class.clone());
                        } else {
                            next.retain(|c| c != class);
                        }
                        self.state
                            .dispatch(Action::SetSelectedClasses { node_idx, classes: next });
                    }
                }
            });
    }

    fn mapping_table(&mut self, ui: &mut egui::Ui) {
        let entries: Vec<(String, String)> = self
            .state
            .store
            .config
            .get()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        TableBuilder::new(ui)
            .striped(true)
            .column(Column::remainder())
            .column(Column::remainder())
            .header(18.0, |mut header| {
                header.col(|ui| {
                    ui.strong("Custom");
                });
                header.col(|ui| {
                    ui.strong("Standard");
                });
            })
            .body(|mut body| {
                for (source, target) in entries {
                    body.row(16.0, |mut row| {
                        row.col(|ui| {
                            ui.label(source);
                        });
                        row.col(|ui| {
                            ui.label(target);
                        });
                    });
                }
            });
    }

    fn canvas_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::central_panel(&ctx.style()).inner_margin(8.0))
            .show(ctx, |ui| {
                // Reset layout if needed
                if self.state.store.layout_reset_needed {
                    layout_grid::set_pending_positions(self.state.store.positions().clone());
                    reset_layout::<LayoutStateGrid>(ui, None);
                    self.state.dispatch(Action::ClearLayoutResetFlag);
                }

                // Delete or Backspace removes the current selection
                if ui.input(|i| {
                    i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace)
                }) {
                    self.state.dispatch(Action::DeleteSelection);
                }

                let settings_interaction = SettingsInteraction::new()
                    .with_dragging_enabled(true)
                    .with_node_clicking_enabled(true)
                    .with_node_selection_enabled(true)
                    .with_edge_clicking_enabled(true)
                    .with_edge_selection_enabled(true);
                // Fit-to-content only on the first frame after a build or
                // load; afterwards pan and zoom are the user's.
                let fit_this_frame = self.state.store.fit_requested;
                let settings_navigation = SettingsNavigation::new()
                    .with_zoom_and_pan_enabled(true)
                    .with_fit_to_screen_enabled(fit_this_frame);
                let settings_style = SettingsStyle::new().with_labels_always(true);

                ui.add(
                    &mut EditorGraphView::new(&mut self.state.store.graph)
                        .with_interactions(&settings_interaction)
                        .with_navigations(&settings_navigation)
                        .with_styles(&settings_style),
                );
                // Graph bounds are only known after a frame has drawn with
                // final positions; keep the request alive through a pending
                // layout reset so the fit uses them.
                if fit_this_frame && !self.state.store.layout_reset_needed {
                    self.state.dispatch(Action::ClearFitToScreenFlag);
                }

                // Track the visible canvas center for free node placement,
                // and keep dragged nodes inside their regions.
                let meta = MetadataFrame::new(None).load(ui);
                let center = meta.screen_to_canvas_pos(ui.max_rect().center());
                self.state.dispatch(Action::SetViewportCenter { center });
                self.state.dispatch(Action::ConfineNodesToRegions);

                let pointer = ui.input(|i| i.pointer.clone());

                // Handle connection creation and draw preview line if needed
                if let Some((from_pos, to_pos)) = self.handle_connection_drag(&pointer) {
                    ui.painter().line_segment(
                        [from_pos, to_pos],
                        egui::Stroke::new(EDGE_PREVIEW_STROKE_WIDTH, EDGE_PREVIEW_COLOR),
                    );
                }

                self.handle_edge_deletion(&pointer);
            });
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        #[cfg(not(target_arch = "wasm32"))]
        self.poll_engine();

        self.menu_bar(ctx);
        self.palette_panel(ctx);
        self.canvas_panel(ctx);

        // Display error dialog if there's an error message
        if let Some(error) = self.state.store.error_message.clone() {
            egui::Window::new("Error")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(&error);
                    if ui.button("OK").clicked() {
                        self.state.dispatch(Action::ClearErrorMessage);
                    }
                });
        }

        self.state.flush_actions();
        self.state.flush_effects();

        // Keep polling while a transformation runs
        if self.state.store.processing {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}
