use egui::{vec2, Color32, Sense, Stroke, Ui};

const GROOVE_HEIGHT: f32 = 3.0;
const HANDLE_RADIUS: f32 = 5.0;
const BAR_HEIGHT: f32 = 20.0;

/// Map a horizontal pixel coordinate within a control of the given width
/// to a value in `[min, max]`. Linear, clamping, monotonic.
pub fn point_to_value(x: f32, width: f32, min: u64, max: u64) -> u64 {
    if width <= 0.0 || max <= min {
        return min;
    }
    let t = (x / width).clamp(0.0, 1.0);
    min + (t * (max - min) as f32).round() as u64
}

/// Horizontal scrub bar with a draggable handle. Pressing anywhere jumps
/// the value to the pointer position, exactly as if a drag ended there.
///
/// `show` returns `Some(value)` only on user interaction; displaying a new
/// value programmatically never produces a notification, which keeps the
/// engine-to-UI update path from echoing back into a seek.
pub struct ScrubBar {
    max: u64,
    desired_width: Option<f32>,
}

impl ScrubBar {
    pub fn new(max: u64) -> Self {
        Self {
            max,
            desired_width: None,
        }
    }

    pub fn width(mut self, width: f32) -> Self {
        self.desired_width = Some(width);
        self
    }

    pub fn show(self, ui: &mut Ui, mut value: u64) -> Option<u64> {
        let width = self.desired_width.unwrap_or_else(|| ui.available_width());
        let (rect, response) =
            ui.allocate_exact_size(vec2(width.max(1.0), BAR_HEIGHT), Sense::click_and_drag());

        let mut moved = None;
        let hold_id = response.id.with("last_sent");
        if response.is_pointer_button_down_on() {
            if let Some(pos) = response.interact_pointer_pos() {
                let new_value =
                    point_to_value(pos.x - rect.left(), rect.width(), 0, self.max);
                let pressed = ui.input(|i| i.pointer.any_pressed());
                // Emit on the press itself and afterwards only when the
                // pointer reaches a value not yet reported during this
                // hold. Comparing against the displayed value instead
                // would re-fire whenever it changes under a held pointer,
                // e.g. when a seek completes and the engine snaps the
                // position to a nearby frame.
                let last_sent: Option<u64> = if pressed {
                    None
                } else {
                    ui.memory(|mem| mem.data.get_temp(hold_id))
                };
                value = new_value;
                if pressed || last_sent != Some(new_value) {
                    ui.memory_mut(|mem| mem.data.insert_temp(hold_id, new_value));
                    moved = Some(new_value);
                }
            }
        } else {
            ui.memory_mut(|mem| mem.data.remove::<u64>(hold_id));
        }

        let enabled = ui.is_enabled();
        let groove_color = if enabled {
            Color32::from_gray(150)
        } else {
            Color32::from_gray(80)
        };
        let fill_color = if enabled {
            Color32::from_gray(200)
        } else {
            Color32::from_gray(100)
        };
        let handle_color = if enabled { Color32::WHITE } else { Color32::GRAY };

        let center_y = rect.center().y;
        let groove = egui::Rect::from_center_size(
            rect.center(),
            vec2(rect.width(), GROOVE_HEIGHT),
        );
        ui.painter().rect_filled(groove, 1.0, groove_color);

        let fraction = if self.max == 0 {
            0.0
        } else {
            (value as f32 / self.max as f32).clamp(0.0, 1.0)
        };
        let handle_x = rect.left() + fraction * rect.width();

        let filled = egui::Rect::from_min_max(
            groove.min,
            egui::pos2(handle_x, groove.max.y),
        );
        ui.painter().rect_filled(filled, 1.0, fill_color);

        ui.painter().circle(
            egui::pos2(handle_x, center_y),
            HANDLE_RADIUS,
            handle_color,
            Stroke::new(1.0, Color32::from_gray(92)),
        );

        moved
    }
}

#[cfg(test)]
mod tests {
    use super::{point_to_value, ScrubBar};
    use egui::{pos2, Context, Event, Id, Modifiers, PointerButton, Pos2, RawInput, Rect};

    #[test]
    fn endpoints_map_to_range_bounds() {
        assert_eq!(point_to_value(0.0, 200.0, 0, 1_000), 0);
        assert_eq!(point_to_value(200.0, 200.0, 0, 1_000), 1_000);
        assert_eq!(point_to_value(0.0, 200.0, 40, 60), 40);
        assert_eq!(point_to_value(200.0, 200.0, 40, 60), 60);
    }

    #[test]
    fn out_of_range_coordinates_clamp() {
        assert_eq!(point_to_value(-50.0, 200.0, 0, 100), 0);
        assert_eq!(point_to_value(250.0, 200.0, 0, 100), 100);
    }

    #[test]
    fn monotonic_non_decreasing_across_width() {
        let mut previous = 0;
        for x in 0..=400 {
            let value = point_to_value(x as f32 * 0.5, 200.0, 0, 125_000);
            assert!(value >= previous, "x={x}: {value} < {previous}");
            assert!(value <= 125_000);
            previous = value;
        }
    }

    #[test]
    fn degenerate_ranges_return_min() {
        assert_eq!(point_to_value(10.0, 0.0, 5, 100), 5);
        assert_eq!(point_to_value(10.0, -1.0, 5, 100), 5);
        assert_eq!(point_to_value(10.0, 200.0, 7, 7), 7);
    }

    // Widget-level emission checks, run against a headless egui context.
    // The bar sits in an area pinned at the origin, 200 px wide with
    // max 1000, so pointer x maps to value 5*x.

    fn run_frame(ctx: &Context, events: Vec<Event>, shown: u64) -> Vec<u64> {
        let mut emitted = Vec::new();
        let input = RawInput {
            screen_rect: Some(Rect::from_min_max(pos2(0.0, 0.0), pos2(400.0, 200.0))),
            events,
            ..Default::default()
        };
        let _ = ctx.run(input, |ctx| {
            egui::Area::new(Id::new("scrub_test"))
                .fixed_pos(pos2(0.0, 0.0))
                .show(ctx, |ui| {
                    if let Some(value) = ScrubBar::new(1_000).width(200.0).show(ui, shown) {
                        emitted.push(value);
                    }
                });
        });
        emitted
    }

    fn press(pos: Pos2) -> Event {
        Event::PointerButton {
            pos,
            button: PointerButton::Primary,
            pressed: true,
            modifiers: Modifiers::default(),
        }
    }

    fn release(pos: Pos2) -> Event {
        Event::PointerButton {
            pos,
            button: PointerButton::Primary,
            pressed: false,
            modifiers: Modifiers::default(),
        }
    }

    #[test]
    fn click_emits_exactly_one_moved_notification() {
        let ctx = Context::default();
        let at = pos2(50.0, 10.0);

        // Motion alone emits nothing (and lets the widget register for
        // hit testing before the press). egui's hit test only latches a
        // widget from the second frame it has been laid out at full size
        // (the first frame of an `Area` is a sizing pass), so warm up
        // with a second motion frame before pressing.
        assert!(run_frame(&ctx, vec![Event::PointerMoved(at)], 0).is_empty());
        run_frame(&ctx, vec![Event::PointerMoved(at)], 0);
        assert_eq!(run_frame(&ctx, vec![press(at)], 0), vec![250]);

        // Button still held, pointer unmoved: nothing further.
        assert!(run_frame(&ctx, vec![], 250).is_empty());
        assert!(run_frame(&ctx, vec![], 250).is_empty());
        assert!(run_frame(&ctx, vec![release(at)], 250).is_empty());
    }

    #[test]
    fn display_change_under_a_held_pointer_does_not_refire() {
        let ctx = Context::default();
        let at = pos2(50.0, 10.0);

        run_frame(&ctx, vec![Event::PointerMoved(at)], 0);
        run_frame(&ctx, vec![Event::PointerMoved(at)], 0);
        assert_eq!(run_frame(&ctx, vec![press(at)], 0), vec![250]);

        // A completed seek snapped the displayed position to a nearby
        // frame; the still-held pointer must not re-issue the old value.
        assert!(run_frame(&ctx, vec![], 240).is_empty());
        assert!(run_frame(&ctx, vec![], 240).is_empty());
    }

    #[test]
    fn drag_emits_per_new_value_and_a_fresh_press_emits_again() {
        let ctx = Context::default();
        let a = pos2(50.0, 10.0);
        let b = pos2(100.0, 10.0);

        run_frame(&ctx, vec![Event::PointerMoved(a)], 0);
        run_frame(&ctx, vec![Event::PointerMoved(a)], 0);
        assert_eq!(run_frame(&ctx, vec![press(a)], 0), vec![250]);
        assert_eq!(run_frame(&ctx, vec![Event::PointerMoved(b)], 250), vec![500]);
        assert!(run_frame(&ctx, vec![release(b)], 500).is_empty());

        // New press at the same spot as before jumps there again even
        // though that value was reported during the previous hold.
        run_frame(&ctx, vec![Event::PointerMoved(a)], 500);
        run_frame(&ctx, vec![Event::PointerMoved(a)], 500);
        assert_eq!(run_frame(&ctx, vec![press(a)], 500), vec![250]);
    }
}
