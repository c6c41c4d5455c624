use super::POLL_INTERVAL;
use crate::audio::AudioEngine;
use crate::input::{InputRouter, KeyboardHandler, RawInput};
use crate::instrument::VoiceManager;
use crate::synth::note::{NoteCatalog, NoteDefinition, NoteId, NoteSource};
use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, Stroke};
use std::time::Instant;

const WHITE_KEY_WIDTH: f32 = 48.0;
const WHITE_KEY_HEIGHT: f32 = 220.0;
const BLACK_KEY_WIDTH: f32 = 30.0;
const BLACK_KEY_HEIGHT: f32 = 136.0;

/// Draws the keyboard and feeds mouse, touch and keyboard input to the
/// voice manager.
pub struct PianoApp<E: AudioEngine> {
    manager: VoiceManager<E>,
    router: InputRouter,
    keyboard: KeyboardHandler,
    catalog: NoteCatalog,
    /// Note the pointer or a finger is holding down, and which of the two.
    pointer_note: Option<(NoteId, NoteSource)>,
    volume: f32,
}

impl<E: AudioEngine> PianoApp<E> {
    pub fn new(manager: VoiceManager<E>, volume: f32) -> Self {
        let catalog = manager.catalog().clone();
        Self {
            router: InputRouter::new(catalog.clone()),
            keyboard: KeyboardHandler::new(),
            catalog,
            manager,
            pointer_note: None,
            volume,
        }
    }

    fn dispatch(&mut self, input: RawInput) {
        if let Some(event) = self.router.route(input) {
            self.manager.handle(&event);
        }
    }

    fn header(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("PIANO+");
            ui.separator();
            if self.manager.is_running() {
                ui.label(format!("{} sounding", self.manager.sounding_count()));
            } else {
                ui.colored_label(Color32::LIGHT_RED, "audio unavailable");
            }
            ui.separator();
            let slider = egui::Slider::new(&mut self.volume, 0.0..=1.0).text("volume");
            if ui.add(slider).changed() {
                self.manager.set_volume(self.volume);
            }
        });
    }

    fn keys(&mut self, ui: &mut egui::Ui) {
        let catalog = self.catalog.clone();
        let whites = catalog.iter().filter(|note| note.is_natural()).count();
        let size = egui::vec2(whites as f32 * WHITE_KEY_WIDTH, WHITE_KEY_HEIGHT);
        let (area, _) = ui.allocate_exact_size(size, egui::Sense::click_and_drag());
        let layout = key_layout(&catalog, area.min);

        let (pressed, down, pos, touching) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_down(),
                i.pointer.interact_pos(),
                i.any_touches(),
            )
        });
        let hit = pos
            .filter(|pos| area.contains(*pos))
            .and_then(|pos| key_at(&layout, pos))
            .map(|note| note.id.clone());

        let (inputs, held) = pointer_inputs(self.pointer_note.take(), hit, pressed, down, touching);
        self.pointer_note = held;
        for input in inputs {
            self.dispatch(input);
        }

        let active = self.manager.active_keys();
        let painter = ui.painter_at(area);
        for (note, rect) in &layout {
            let is_active = active.contains(note.id.as_str());
            let (fill, text) = match (note.is_natural(), is_active) {
                (true, false) => (Color32::WHITE, Color32::GRAY),
                (true, true) => (Color32::from_gray(200), Color32::DARK_GRAY),
                (false, false) => (Color32::from_gray(17), Color32::from_white_alpha(100)),
                (false, true) => (Color32::BLACK, Color32::from_white_alpha(60)),
            };
            painter.rect_filled(*rect, 4.0, fill);
            painter.rect_stroke(*rect, 4.0, Stroke::new(1.0, Color32::from_gray(60)));
            painter.text(
                rect.center_bottom() - egui::vec2(0.0, 12.0),
                Align2::CENTER_BOTTOM,
                note.binding.to_uppercase(),
                FontId::monospace(11.0),
                text,
            );
        }
    }
}

/// Turns one frame of pointer state into router input.
///
/// A hold ends with the event matching how it began, once the button or
/// finger is lifted or moves off the key. Moving onto another key while down
/// does not start it.
fn pointer_inputs(
    held: Option<(NoteId, NoteSource)>,
    hit: Option<NoteId>,
    pressed: bool,
    down: bool,
    touching: bool,
) -> (Vec<RawInput>, Option<(NoteId, NoteSource)>) {
    let mut inputs = Vec::new();
    let mut held = held;

    if let Some((note, source)) = held.take() {
        if down && hit.as_ref() == Some(&note) {
            held = Some((note, source));
        } else {
            inputs.push(match (source, down) {
                (NoteSource::Touch, _) => RawInput::TouchEnd(note),
                (_, true) => RawInput::PointerLeave(note),
                (_, false) => RawInput::PointerUp(note),
            });
        }
    }

    if pressed && held.is_none() {
        if let Some(note) = hit {
            let (input, source) = if touching {
                (RawInput::TouchStart(note.clone()), NoteSource::Touch)
            } else {
                (RawInput::PointerDown(note.clone()), NoteSource::Pointer)
            };
            inputs.push(input);
            held = Some((note, source));
        }
    }

    (inputs, held)
}

/// Key rectangles, naturals first so accidentals are drawn over them.
fn key_layout(catalog: &NoteCatalog, origin: Pos2) -> Vec<(&NoteDefinition, Rect)> {
    let mut naturals = Vec::new();
    let mut accidentals = Vec::new();
    let mut white_index = 0;

    for note in catalog.iter() {
        let x = white_index as f32 * WHITE_KEY_WIDTH;
        if note.is_natural() {
            let rect = Rect::from_min_size(
                origin + egui::vec2(x, 0.0),
                egui::vec2(WHITE_KEY_WIDTH, WHITE_KEY_HEIGHT),
            );
            naturals.push((note, rect));
            white_index += 1;
        } else {
            let rect = Rect::from_min_size(
                origin + egui::vec2(x - BLACK_KEY_WIDTH / 2.0, 0.0),
                egui::vec2(BLACK_KEY_WIDTH, BLACK_KEY_HEIGHT),
            );
            accidentals.push((note, rect));
        }
    }

    naturals.extend(accidentals);
    naturals
}

/// Topmost key under `pos`.
fn key_at<'a>(layout: &[(&'a NoteDefinition, Rect)], pos: Pos2) -> Option<&'a NoteDefinition> {
    layout
        .iter()
        .rev()
        .find(|(_, rect)| rect.contains(pos))
        .map(|(note, _)| *note)
}

impl<E: AudioEngine> eframe::App for PianoApp<E> {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        for input in self.keyboard.poll() {
            self.dispatch(input);
        }

        egui::TopBottomPanel::top("header").show(ctx, |ui| self.header(ui));
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::horizontal().show(ui, |ui| self.keys(ui));
        });

        self.manager.tick();

        // The keyboard is polled, so keep frames coming even when idle.
        let wait = self
            .manager
            .next_cleanup_due()
            .map(|due| due.saturating_duration_since(Instant::now()))
            .map_or(POLL_INTERVAL, |until_due| until_due.min(POLL_INTERVAL));
        ctx.request_repaint_after(wait);
    }
}

impl<E: AudioEngine> Drop for PianoApp<E> {
    fn drop(&mut self) {
        self.manager.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::note::NoteIntent;

    fn note(id: &str) -> Option<NoteId> {
        Some(NoteId::from(id))
    }

    /// Feeds frames of `(hit, pressed, down, touching)` through
    /// `pointer_inputs` and a router, collecting the note events.
    fn play(frames: &[(Option<NoteId>, bool, bool, bool)]) -> Vec<(NoteIntent, String)> {
        let mut router = InputRouter::new(NoteCatalog::two_row_layout());
        let mut held = None;
        let mut events = Vec::new();

        for (hit, pressed, down, touching) in frames.iter().cloned() {
            let (inputs, next) = pointer_inputs(held, hit, pressed, down, touching);
            held = next;
            for input in inputs {
                if let Some(event) = router.route(input) {
                    events.push((event.intent, event.note.to_string()));
                }
            }
        }
        events
    }

    #[test]
    fn repeated_taps_each_press() {
        let tap_c3 = [(note("C3"), true, true, true), (note("C3"), false, false, false)];
        let frames: Vec<_> = tap_c3.iter().chain(tap_c3.iter()).cloned().collect();

        assert_eq!(
            play(&frames),
            vec![
                (NoteIntent::Press, "C3".to_string()),
                (NoteIntent::Release, "C3".to_string()),
                (NoteIntent::Press, "C3".to_string()),
                (NoteIntent::Release, "C3".to_string()),
            ]
        );
    }

    #[test]
    fn tap_ends_with_touch_end() {
        let (inputs, held) = pointer_inputs(None, note("A4"), true, true, true);
        assert_eq!(inputs, vec![RawInput::TouchStart(NoteId::from("A4"))]);

        let (inputs, held) = pointer_inputs(held, note("A4"), false, false, false);
        assert_eq!(inputs, vec![RawInput::TouchEnd(NoteId::from("A4"))]);
        assert!(held.is_none());
    }

    #[test]
    fn dragging_off_a_key_releases_without_glissando() {
        let frames = [
            (note("C3"), true, true, false),
            (note("C3"), false, true, false),
            (note("D3"), false, true, false),
            (note("E3"), false, true, false),
            (note("E3"), false, false, false),
        ];

        assert_eq!(
            play(&frames),
            vec![
                (NoteIntent::Press, "C3".to_string()),
                (NoteIntent::Release, "C3".to_string()),
            ]
        );
    }

    #[test]
    fn mouse_released_outside_the_keys() {
        let (_, held) = pointer_inputs(None, note("G3"), true, true, false);

        let (inputs, held) = pointer_inputs(held, None, false, false, false);
        assert_eq!(inputs, vec![RawInput::PointerUp(NoteId::from("G3"))]);
        assert!(held.is_none());
    }

    #[test]
    fn touch_sliding_onto_another_key() {
        let (_, held) = pointer_inputs(None, note("C3"), true, true, true);

        let (inputs, held) = pointer_inputs(held, note("C#3"), false, true, true);
        assert_eq!(inputs, vec![RawInput::TouchEnd(NoteId::from("C3"))]);
        assert!(held.is_none());

        let (inputs, _) = pointer_inputs(held, note("C#3"), false, false, false);
        assert!(inputs.is_empty());
    }

    #[test]
    fn press_on_empty_space_does_nothing() {
        let (inputs, held) = pointer_inputs(None, None, true, true, false);
        assert!(inputs.is_empty());
        assert!(held.is_none());
    }

    #[test]
    fn accidentals_sit_on_top_of_naturals() {
        let catalog = NoteCatalog::two_row_layout();
        let layout = key_layout(&catalog, Pos2::ZERO);

        // Boundary between C3 and D3, near the top: C#3 covers it.
        let pos = Pos2::new(WHITE_KEY_WIDTH, 10.0);
        assert_eq!(key_at(&layout, pos).map(|n| n.id.as_str()), Some("C#3"));

        // Same x, below the black keys: back on a natural.
        let pos = Pos2::new(WHITE_KEY_WIDTH + 2.0, BLACK_KEY_HEIGHT + 10.0);
        assert_eq!(key_at(&layout, pos).map(|n| n.id.as_str()), Some("D3"));

        assert!(key_at(&layout, Pos2::new(-5.0, 10.0)).is_none());
    }

    #[test]
    fn one_slot_per_natural() {
        let catalog = NoteCatalog::two_row_layout();
        let layout = key_layout(&catalog, Pos2::ZERO);
        let naturals = layout.iter().filter(|(n, _)| n.is_natural()).count();

        assert_eq!(layout.len(), catalog.len());
        assert_eq!(naturals, 21);
    }
}
