//! Scratch Ticket entry point
//!
//! On the web the app is driven by `requestAnimationFrame`-style ticks from
//! the host page. Natively it plays a short scripted session headlessly.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;

    use scratch_ticket::assets::GameAssets;
    use scratch_ticket::audio::WebAudioBackend;
    use scratch_ticket::carousel::SlotId;
    use scratch_ticket::settings::LocalStorageStore;
    use scratch_ticket::ui::ButtonId;
    use scratch_ticket::{App, FrameInput, GameConfig};

    thread_local! {
        static APP: RefCell<Option<App>> = const { RefCell::new(None) };
    }

    pub fn start() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialised".into());
        }

        log::info!("Scratch Ticket starting...");
        let config = GameConfig {
            seed: entropy_seed(),
            ..Default::default()
        };
        let backend = WebAudioBackend::new(config.effect_sources);
        let app = App::new(
            config,
            GameAssets::builtin(),
            Box::new(backend),
            Box::new(LocalStorageStore::new()),
        );
        APP.with(|cell| *cell.borrow_mut() = Some(app));
    }

    fn entropy_seed() -> u64 {
        let mut bytes = [0u8; 8];
        if getrandom::fill(&mut bytes).is_err() {
            log::warn!("No entropy source, using fixed seed");
        }
        u64::from_le_bytes(bytes)
    }

    fn button_from_name(name: &str) -> Option<ButtonId> {
        match name {
            "start" => Some(ButtonId::Start),
            "settings" => Some(ButtonId::Settings),
            "exit" => Some(ButtonId::Exit),
            "close" => Some(ButtonId::ClosePopup),
            "back" => Some(ButtonId::Back),
            _ => name
                .strip_prefix("buy:")
                .and_then(|slot| slot.parse().ok())
                .map(|slot| ButtonId::Buy(SlotId(slot))),
        }
    }

    /// One frame from the host page. `button` names the button hit this
    /// frame, empty for none. Returns the balance text, empty outside a game.
    #[wasm_bindgen]
    pub fn frame(
        dt: f32,
        x: f32,
        y: f32,
        pressed: bool,
        held: bool,
        released: bool,
        button: &str,
    ) -> String {
        let input = FrameInput {
            pointer: Vec2::new(x, y),
            pressed,
            held,
            released,
            button: button_from_name(button),
            ..Default::default()
        };
        APP.with(|cell| {
            let mut app = cell.borrow_mut();
            let Some(app) = app.as_mut() else {
                return String::new();
            };
            app.tick(&input, dt);
            app.game().map(|g| g.currency_text()).unwrap_or_default()
        })
    }

    #[wasm_bindgen]
    pub fn set_volumes(music: f32, effects: f32) {
        APP.with(|cell| {
            if let Some(app) = cell.borrow_mut().as_mut() {
                let input = FrameInput {
                    music_slider: Some(music),
                    effects_slider: Some(effects),
                    ..Default::default()
                };
                app.tick(&input, 0.0);
            }
        });
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_app::start();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Scratch Ticket (native) starting...");
    log::info!("Native mode runs a headless demo session - build for wasm32 for the web version");

    demo::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use glam::Vec2;

    use scratch_ticket::assets::GameAssets;
    use scratch_ticket::audio::RecordingBackend;
    use scratch_ticket::game::GameEvent;
    use scratch_ticket::settings::JsonFileStore;
    use scratch_ticket::ui::ButtonId;
    use scratch_ticket::{App, FrameInput, GameConfig, Screen};

    const DT: f32 = 1.0 / 60.0;

    fn idle(app: &mut App, frames: usize) {
        for _ in 0..frames {
            app.tick(&FrameInput::default(), DT);
        }
    }

    fn click(app: &mut App, id: ButtonId) {
        app.tick(&FrameInput::click(id), DT);
        idle(app, 30);
    }

    fn report(app: &mut App) {
        for event in app.drain_events() {
            match event {
                GameEvent::PurchaseStarted { slot, price } => {
                    println!("  bought ticket on {:?} for {}", slot, price)
                }
                GameEvent::PurchaseCompleted { reward, .. } => println!("  scratched: prize {}", reward),
                GameEvent::PurchaseFailed(e) => println!("  purchase failed: {}", e),
                GameEvent::PurchaseInterrupted { slot, price } => {
                    println!("  purchase on {:?} interrupted, {} refunded", slot, price)
                }
                GameEvent::CenterChanged(i) => println!("  centre ticket is now #{}", i),
                GameEvent::RedirectToMenu => println!("  out of money, back to the menu"),
            }
        }
        if let Some(game) = app.game() {
            let centre = game.carousel().center_slot();
            println!(
                "  balance {} | centre '{}' price {} prize {}",
                game.currency_text(),
                centre.title(),
                centre.price_label(),
                centre.reward_label()
            );
        }
    }

    /// Rub back and forth over the centre ticket until it is scratched off
    fn scratch_centre(app: &mut App) {
        for stroke in 0..400 {
            let Some(game) = app.game() else { return };
            if !game.is_purchase_active() {
                return;
            }
            let view = game.carousel().center_slot();
            let rect = view.scratch().rect();
            let t = stroke as f32 / 20.0;
            let offset = Vec2::new((t * 7.0).sin(), ((stroke % 20) as f32 / 10.0) - 1.0) * rect.size * 0.5;
            app.tick(&FrameInput::hold(rect.center + offset, stroke == 0), DT);
        }
        app.tick(&FrameInput::release(Vec2::ZERO), DT);
    }

    fn swipe(app: &mut App, dx: f32) {
        let start = Vec2::new(0.0, 600.0);
        app.tick(&FrameInput::hold(start, true), DT);
        app.tick(&FrameInput::hold(start + Vec2::new(dx, 0.0), false), DT);
        app.tick(&FrameInput::release(start + Vec2::new(dx, 0.0)), DT);
        idle(app, 70);
    }

    pub fn run() {
        let store = JsonFileStore::open(std::env::temp_dir().join("scratch-ticket-preferences.json"));
        let config = GameConfig::default();
        let backend = RecordingBackend::new(config.effect_sources);
        let journal = backend.journal();
        let mut app = App::new(config, GameAssets::builtin(), Box::new(backend), Box::new(store));

        println!("\nOpening the game screen...");
        click(&mut app, ButtonId::Start);
        if app.screen() != Screen::Game {
            log::error!("Game screen failed to open");
            return;
        }
        report(&mut app);

        for round in 1..=3 {
            println!("\nRound {}", round);
            let Some(slot) = app.game().map(|g| g.carousel().center_slot_id()) else {
                break;
            };
            click(&mut app, ButtonId::Buy(slot));
            scratch_centre(&mut app);
            idle(&mut app, 70);
            report(&mut app);
            if app.screen() != Screen::Game {
                break;
            }
            swipe(&mut app, -400.0);
            report(&mut app);
        }

        println!("\nOpening settings and lowering the music...");
        app.return_to_menu();
        click(&mut app, ButtonId::Settings);
        app.tick(
            &FrameInput {
                music_slider: Some(0.4),
                ..Default::default()
            },
            DT,
        );
        click(&mut app, ButtonId::ClosePopup);
        click(&mut app, ButtonId::Exit);

        let journal = journal.borrow();
        println!(
            "\nDone (quit: {}): {} effects played, music tracks started: {:?}",
            app.should_quit(),
            journal.effects_played.len(),
            journal.music_started
        );
    }
}
