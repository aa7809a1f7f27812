//! Human Dash entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlInputElement, KeyboardEvent};

    use human_dash::consts::*;
    use human_dash::persistence::NoRemote;
    use human_dash::platform::input::activation_for_event;
    use human_dash::platform::web::{
        AnimationFrames, BrowserStorage, LEADERBOARD_URL, fetch_leaderboard, post_score,
    };
    use human_dash::platform::{Activate, activation_for_key};
    use human_dash::sim::ObstacleKind;
    use human_dash::{Phase, ScoreEntry, ScoreStore, Session, SessionEvent, Tuning};

    type GameSession = Session<BrowserStorage, NoRemote>;

    /// Game instance holding all state
    struct Game {
        session: GameSession,
        frames: AnimationFrames,
        ctx: Option<CanvasRenderingContext2d>,
    }

    impl Game {
        /// Feed an activate edge; Space inside the name field never gets here
        fn activate(&mut self, edge: Activate) -> Option<SessionEvent> {
            let Game { session, frames, .. } = self;
            session.activate(edge, frames)
        }

        /// Draw the current frame. Without a 2D context this is a no-op.
        fn draw(&self) {
            let Some(ctx) = self.ctx.as_ref() else {
                return;
            };

            ctx.set_fill_style_str("#0d1117");
            ctx.fill_rect(0.0, 0.0, SURFACE_WIDTH as f64, SURFACE_HEIGHT as f64);

            ctx.set_fill_style_str("#30363d");
            ctx.fill_rect(
                0.0,
                FLOOR_Y as f64,
                SURFACE_WIDTH as f64,
                (SURFACE_HEIGHT - FLOOR_Y) as f64,
            );

            let Some(game) = self.session.game() else {
                return;
            };

            for particle in &game.particles {
                ctx.set_global_alpha(particle.life.clamp(0.0, 1.0) as f64);
                ctx.set_fill_style_str(&format!("#{:06x}", particle.color & 0x00ff_ffff));
                ctx.fill_rect(
                    particle.pos.x as f64,
                    particle.pos.y as f64,
                    particle.size as f64,
                    particle.size as f64,
                );
            }
            ctx.set_global_alpha(1.0);

            for obstacle in &game.obstacles {
                let (x, y) = (obstacle.pos.x as f64, obstacle.pos.y as f64);
                let (w, h) = (obstacle.size.x as f64, obstacle.size.y as f64);
                match obstacle.kind {
                    ObstacleKind::Spike => {
                        ctx.set_fill_style_str("#f85149");
                        ctx.begin_path();
                        ctx.move_to(x, y + h);
                        ctx.line_to(x + w / 2.0, y);
                        ctx.line_to(x + w, y + h);
                        ctx.close_path();
                        ctx.fill();
                    }
                    ObstacleKind::Block => {
                        ctx.set_fill_style_str("#8b949e");
                        ctx.fill_rect(x, y, w, h);
                    }
                }
            }

            // Player, rotated about its center
            let player = &game.player;
            let center = player.center();
            let half = player.size.x as f64 / 2.0;
            ctx.save();
            let _ = ctx.translate(center.x as f64, center.y as f64);
            let _ = ctx.rotate((player.rotation as f64).to_radians());
            ctx.set_fill_style_str("#58a6ff");
            ctx.fill_rect(-half, -half, half * 2.0, half * 2.0);
            ctx.restore();

            ctx.set_fill_style_str("#e6edf3");
            ctx.set_font("20px monospace");
            let _ = ctx.fill_text(&format!("SCORE {}", game.score()), 16.0, 32.0);
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            if let Some(el) = document.query_selector("#hud-score .hud-value").ok().flatten() {
                el.set_text_content(Some(&self.session.score().to_string()));
            }
            if let Some(el) = document.query_selector("#hud-best .hud-value").ok().flatten() {
                el.set_text_content(Some(&self.session.scores().personal_best().to_string()));
            }
        }
    }

    fn set_visible(id: &str, visible: bool) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
        }
    }

    fn render_leaderboard(entries: &[ScoreEntry]) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let Some(list) = document.get_element_by_id("leaderboard") else {
            return;
        };
        list.set_inner_html("");
        for (rank, entry) in entries.iter().enumerate() {
            if let Ok(item) = document.create_element("li") {
                item.set_text_content(Some(&format!(
                    "{:>2}. {:<15} {}",
                    rank + 1,
                    entry.name,
                    entry.score
                )));
                let _ = list.append_child(&item);
            }
        }
    }

    fn handle_events(game: &Rc<RefCell<Game>>, events: Vec<SessionEvent>) {
        for event in events {
            match event {
                SessionEvent::Started { .. } => {
                    set_visible("game-over", false);
                    set_visible("name-entry", false);
                    set_visible("start-prompt", false);
                }
                SessionEvent::GameOver { score, cause } => {
                    log::info!("Game over at {} ({:?})", score, cause);
                    set_visible("game-over", true);
                }
                SessionEvent::NewRecord { score } => {
                    log::info!("New record: {}", score);
                    set_visible("name-entry", true);
                }
                SessionEvent::Submitted { leaderboard } => {
                    render_leaderboard(&leaderboard);
                    set_visible("name-entry", false);
                    set_visible("start-prompt", true);
                }
                SessionEvent::Skipped => {
                    set_visible("name-entry", false);
                    set_visible("start-prompt", true);
                }
            }
        }
        game.borrow().update_hud();
    }

    fn on_frame(game: &Rc<RefCell<Game>>) {
        let events = {
            let mut g = game.borrow_mut();
            let Game { session, frames, .. } = &mut *g;
            match frames.take_fired() {
                Some(token) => session.frame(token, frames),
                None => Vec::new(),
            }
        };
        {
            let g = game.borrow();
            g.draw();
            g.update_hud();
        }
        if !events.is_empty() {
            handle_events(game, events);
        }
    }

    /// Pull the shared board into the local cache
    fn sync_leaderboard(game: Rc<RefCell<Game>>) {
        wasm_bindgen_futures::spawn_local(async move {
            match fetch_leaderboard(LEADERBOARD_URL).await {
                Ok(entries) => {
                    render_leaderboard(&entries);
                    game.borrow_mut().session.scores_mut().absorb(entries);
                }
                Err(e) => {
                    log::warn!("Leaderboard fetch failed, showing cached board: {}", e);
                    render_leaderboard(&game.borrow().session.scores().cached());
                }
            }
        });
    }

    /// Send a submission to the shared board and adopt its answer
    fn publish_score(game: Rc<RefCell<Game>>, name: String, score: u64) {
        wasm_bindgen_futures::spawn_local(async move {
            match post_score(LEADERBOARD_URL, &name, score).await {
                Ok(entries) => {
                    render_leaderboard(&entries);
                    game.borrow_mut().session.scores_mut().absorb(entries);
                }
                Err(e) => log::warn!("Leaderboard post failed, kept locally: {}", e),
            }
        });
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");
        log::info!("Human Dash starting...");

        let window = web_sys::window().expect("No window");
        let document = window.document().expect("No document");
        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("No canvas element")
            .dyn_into()
            .expect("Not a canvas");
        canvas.set_width(SURFACE_WIDTH as u32);
        canvas.set_height(SURFACE_HEIGHT as u32);

        let ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok());
        if ctx.is_none() {
            log::warn!("2D context unavailable, running without drawing");
        }

        let storage = BrowserStorage::open();
        let tuning = Tuning::load(&storage);
        let scores = ScoreStore::open(storage, NoRemote, &tuning);
        let seed = js_sys::Date::now() as u64;

        let game = Rc::new(RefCell::new(Game {
            session: Session::new(tuning, scores, seed),
            frames: AnimationFrames::new(),
            ctx,
        }));

        {
            let game_cb = game.clone();
            let callback = Closure::<dyn FnMut(f64)>::new(move |_time: f64| on_frame(&game_cb));
            game.borrow_mut().frames.set_callback(callback);
        }

        setup_pointer_handlers(&canvas, game.clone());
        setup_keyboard_handlers(game.clone());
        setup_name_entry(game.clone());
        setup_retry_button(game.clone());
        setup_unload(game.clone());

        {
            let g = game.borrow();
            g.draw();
            g.update_hud();
        }
        set_visible("start-prompt", true);
        sync_leaderboard(game);

        log::info!("Game initialized");
    }

    fn setup_pointer_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        for event_type in ["mousedown", "mouseup", "touchstart", "touchend", "touchcancel"] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::Event| {
                let Some(edge) = activation_for_event(&event.type_()) else {
                    return;
                };
                event.prevent_default();
                let started = game.borrow_mut().activate(edge);
                if let Some(event) = started {
                    handle_events(&game, vec![event]);
                }
            });
            let _ = canvas
                .add_event_listener_with_callback(event_type, closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_keyboard_handlers(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        for event_type in ["keydown", "keyup"] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let Some(edge) = activation_for_key(&event.type_(), &event.key(), event.repeat())
                else {
                    return;
                };
                // Let Space through to the name field
                if game.borrow().session.phase() == Phase::NameEntry {
                    return;
                }
                event.prevent_default();
                let started = game.borrow_mut().activate(edge);
                if let Some(event) = started {
                    handle_events(&game, vec![event]);
                }
            });
            let _ = window
                .add_event_listener_with_callback(event_type, closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_name_entry(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        if let Some(btn) = document.get_element_by_id("submit-name") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let name = web_sys::window()
                    .and_then(|w| w.document())
                    .and_then(|d| d.get_element_by_id("name-input"))
                    .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
                    .map(|input| input.value())
                    .unwrap_or_default();

                let (event, score) = {
                    let mut g = game.borrow_mut();
                    let score = g.session.final_score();
                    (g.session.submit_name(&name), score)
                };
                if let Some(event) = event {
                    handle_events(&game, vec![event]);
                    publish_score(game.clone(), name, score);
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(btn) = document.get_element_by_id("skip-name") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let event = game.borrow_mut().session.skip_name();
                if let Some(event) = event {
                    handle_events(&game, vec![event]);
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_retry_button(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        if let Some(btn) = document.get_element_by_id("retry-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let event = {
                    let mut g = game.borrow_mut();
                    let Game { session, frames, .. } = &mut *g;
                    session.retry(frames)
                };
                if let Some(event) = event {
                    handle_events(&game, vec![event]);
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Cancel the frame loop when the page goes away
    fn setup_unload(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let mut g = game.borrow_mut();
            let Game { session, frames, .. } = &mut *g;
            session.shutdown(frames);
        });
        let _ = window.add_event_listener_with_callback("pagehide", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Human Dash (native) starting...");
    log::info!("Native mode runs a headless demo - run with `trunk serve` for the web version");

    demo::run(std::env::args().nth(1).and_then(|s| s.parse().ok()).unwrap_or(42));
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless demo: an autopilot plays one session, then the score goes
/// through the leaderboard endpoint handlers.
#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use human_dash::api::LeaderboardApi;
    use human_dash::consts::PLAYER_X;
    use human_dash::persistence::{KvRemote, MemoryStore};
    use human_dash::platform::{Activate, ManualFrames};
    use human_dash::sim::GameState;
    use human_dash::{Phase, ScoreStore, Session, SessionEvent, Tuning};

    /// Frames to give up after if the autopilot never dies
    const MAX_FRAMES: u32 = 20_000;

    /// Jump when the nearest obstacle ahead is within this many ticks of travel
    const LOOKAHEAD_TICKS: f32 = 7.0;

    /// Press when an obstacle is closing in and the player is on a surface
    fn autopilot(game: &GameState) -> bool {
        if !game.player.grounded {
            return false;
        }
        let front = PLAYER_X + game.player.size.x;
        game.obstacles
            .iter()
            .filter(|o| o.right() > game.player.pos.x && o.pos.y < game.player.bottom())
            .map(|o| o.pos.x - front)
            .filter(|gap| *gap >= 0.0)
            .any(|gap| gap < game.speed * LOOKAHEAD_TICKS)
    }

    pub fn run(seed: u64) {
        let tuning = Tuning::default();
        let scores = ScoreStore::open(MemoryStore::new(), KvRemote::new(MemoryStore::new()), &tuning);
        let mut session = Session::new(tuning.clone(), scores, seed);
        let mut frames = ManualFrames::new();

        session.start(seed, &mut frames);

        let mut events = Vec::new();
        let mut frame_count = 0;
        while let Some(token) = frames.fire() {
            if frame_count >= MAX_FRAMES {
                log::info!("Autopilot survived {} frames, stopping", MAX_FRAMES);
                session.shutdown(&mut frames);
                break;
            }
            frame_count += 1;

            let jump = session.game().is_some_and(autopilot);
            if jump {
                session.activate(Activate::Press, &mut frames);
            }
            events.extend(session.frame(token, &mut frames));
            if jump {
                session.activate(Activate::Release, &mut frames);
            }
        }

        for event in &events {
            match event {
                SessionEvent::GameOver { score, cause } => {
                    println!("Game over after {} frames: score {} ({:?})", frame_count, score, cause)
                }
                SessionEvent::NewRecord { score } => println!("New personal best: {}", score),
                _ => {}
            }
        }

        let score = session.final_score();
        if session.phase() == Phase::NameEntry {
            if let Some(SessionEvent::Submitted { leaderboard }) = session.submit_name("autopilot") {
                println!("Local leaderboard: {} entries", leaderboard.len());
            }
        }

        let mut api = LeaderboardApi::new(KvRemote::new(MemoryStore::new()), &tuning);
        let body = serde_json::json!({ "name": "autopilot", "score": score }).to_string();
        let response = api.handle("POST", &body);
        println!("POST /api/leaderboard -> {} {}", response.status, response.body);
        let response = api.handle("GET", "");
        println!("GET  /api/leaderboard -> {} {}", response.status, response.body);
    }
}
