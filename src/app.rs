use crate::input::{
    map_food_key, map_menu_key, next_key, FoodChoice, LineEdit, LineStep, MenuAction,
};
use crate::render::{
    event_text, food_lines, menu_lines, recap_lines, status_lines, Line, Terminal,
};
use crate::Cli;
use anyhow::Result;
use chrono::{DateTime, Utc};
use crossterm::style::Color;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use termipet::config::{load_settings, save_settings_atomic, Paths, Settings};
use termipet::model::{FOODS, NAME_MAX};
use termipet::storage::{load_pet, save_pet_atomic, Loaded};
use termipet::{NoOp, Pet, PetError, Rates, SimEvent};

const AUTOSAVE_EVERY: Duration = Duration::from_secs(30);

enum Screen {
    Menu,
    Status,
    Foods,
    Recap(Vec<SimEvent>),
}

pub(crate) struct App {
    settings: Settings,
    rates: Rates,
    paths: Paths,
    save_path: PathBuf,
    pet: Pet,
    term: Terminal,
    screen: Screen,
    message: Option<Line>,
    autosave_at: Instant,
}

impl App {
    fn init(cli: Cli, paths: Paths) -> Result<Option<Self>> {
        let mut settings = load_settings(&paths.settings_path);
        if let Some(owner) = cli.owner.clone() {
            settings.owner = Some(owner);
        }
        let rates = settings.session_rates(cli.speed);
        let pet_file = cli.pet.clone().unwrap_or_else(|| settings.pet_file.clone());
        let save_path = paths.pet_path(&pet_file);

        let mut term = Terminal::begin(settings.enable_color)?;

        let now = Utc::now();
        let mut message = None;
        let mut screen = Screen::Menu;
        let pet = match load_pet(&save_path, now) {
            Loaded::Pet(mut pet) => {
                let events = pet.refresh(now, &rates);
                if !events.is_empty() {
                    screen = Screen::Recap(events);
                }
                message = Some(Line::colored(format!(">> Loading {}...", pet.name), Color::Green));
                pet
            }
            Loaded::Missing => {
                match create_pet(&mut term, cli.name.as_deref(), settings.owner.clone(), None)? {
                    Some(pet) => pet,
                    None => return Ok(None),
                }
            }
            Loaded::Discarded(e) => {
                let why = format!("Could not load pet file ({e}). Creating a new pet...");
                let owner = settings.owner.clone();
                match create_pet(&mut term, cli.name.as_deref(), owner, Some(why))? {
                    Some(pet) => pet,
                    None => return Ok(None),
                }
            }
        };

        tracing::info!(
            pet = %pet.name,
            path = %save_path.display(),
            fullness = pet.state.fullness,
            energy = pet.state.energy,
            state = pet.state.sleep.label(),
            "session started"
        );

        Ok(Some(Self {
            settings,
            rates,
            paths,
            save_path,
            pet,
            term,
            screen,
            message,
            autosave_at: Instant::now() + AUTOSAVE_EVERY,
        }))
    }

    fn run(&mut self) -> Result<()> {
        loop {
            self.render()?;
            let key = next_key()?;

            let now = Utc::now();
            let events = self.pet.refresh(now, &self.rates);
            if let Some(ev) = events.last() {
                self.message = Some(Line::colored(
                    format!(">> {}", event_text(&self.pet.name, ev)),
                    Color::Yellow,
                ));
            }

            match self.screen {
                Screen::Recap(_) | Screen::Status => self.screen = Screen::Menu,
                Screen::Foods => match map_food_key(&key) {
                    Some(FoodChoice::Pick(i)) => {
                        if let Some(refusal) = feeding_refusal(&self.pet) {
                            self.say(refusal, Color::Yellow);
                        } else {
                            self.feed(i, now);
                        }
                        self.screen = Screen::Menu;
                    }
                    Some(FoodChoice::Back) => self.screen = Screen::Menu,
                    None => self.say(">> Invalid food selection!", Color::Red),
                },
                Screen::Menu => match map_menu_key(&key) {
                    Some(MenuAction::SaveAndExit) => break,
                    Some(action) => self.dispatch(action),
                    None => self.say(">> Please press a number from the menu.", Color::Red),
                },
            }

            if Instant::now() >= self.autosave_at {
                if let Err(e) = save_pet_atomic(&self.save_path, &self.pet) {
                    tracing::warn!(error = %e, "autosave failed");
                }
                self.autosave_at = Instant::now() + AUTOSAVE_EVERY;
            }
        }

        self.pet.refresh(Utc::now(), &self.rates);
        save_pet_atomic(&self.save_path, &self.pet)?;
        self.term.end()?;
        save_settings_atomic(&self.paths.settings_path, &self.settings)?;
        println!("Game saved to {}!", self.save_path.display());
        println!("Good Bye!");
        Ok(())
    }

    fn dispatch(&mut self, action: MenuAction) {
        let name = self.pet.name.clone();
        let now = Utc::now();
        match action {
            MenuAction::ViewStatus => {
                self.message = None;
                self.screen = Screen::Status;
            }
            MenuAction::Feed => match feeding_refusal(&self.pet) {
                Some(refusal) => self.say(refusal, Color::Yellow),
                None => {
                    self.message = None;
                    self.screen = Screen::Foods;
                }
            },
            MenuAction::GoToBed => match self.pet.go_to_bed(now, &self.rates) {
                Ok(()) => self.say(format!(">> {name} is now sleeping!"), Color::Green),
                Err(PetError::NoOpTransition(NoOp::AlreadySleeping)) => {
                    self.say(format!(">> {name} is sleeping already!"), Color::Yellow)
                }
                Err(e) => self.say(format!(">> {e}"), Color::Red),
            },
            MenuAction::WakeUp => match self.pet.wake_up(now, &self.rates) {
                Ok(()) => self.say(
                    format!(">> {name} is at {}% energy!", self.pet.state.energy as u32),
                    Color::Green,
                ),
                Err(PetError::NoOpTransition(NoOp::NotSleeping)) => {
                    self.say(format!(">> {name} is not sleeping!"), Color::Yellow)
                }
                Err(e) => self.say(format!(">> {e}"), Color::Red),
            },
            MenuAction::SaveAndExit => {}
        }
    }

    fn feed(&mut self, index: usize, now: DateTime<Utc>) {
        let food = FOODS[index];
        let name = self.pet.name.clone();
        match self.pet.feed(food.fill, now, &self.rates) {
            Ok(()) => {
                tracing::debug!(food = food.name, fullness = self.pet.state.fullness, "fed");
                self.say(
                    format!(
                        ">> {name} ate a {}! {name} is at {}% fullness!",
                        food.name.to_lowercase(),
                        self.pet.state.fullness as u32
                    ),
                    Color::Green,
                );
            }
            Err(e) => self.say(format!(">> {e}"), Color::Red),
        }
    }

    fn say(&mut self, text: impl Into<String>, fg: Color) {
        self.message = Some(Line::colored(text, fg));
    }

    fn render(&mut self) -> Result<()> {
        let mut lines = match &self.screen {
            Screen::Menu => menu_lines(),
            Screen::Status => status_lines(&self.pet, Utc::now()),
            Screen::Foods => food_lines(),
            Screen::Recap(events) => recap_lines(&self.pet, events),
        };
        if let Some(msg) = &self.message {
            lines.insert(0, Line::plain(""));
            lines.insert(0, msg.clone());
        }
        self.term.present(&lines)
    }
}

/// The menu refuses food for a full or sleeping pet; `Pet::feed` itself
/// accepts both. Checked again on the food screen since the pet may have
/// filled up or fallen asleep while the owner was choosing.
fn feeding_refusal(pet: &Pet) -> Option<String> {
    let name = &pet.name;
    if pet.is_full() {
        Some(format!(">> {name} is already full!"))
    } else if pet.is_asleep() {
        Some(format!(">> {name} is sleeping and can't eat right now!"))
    } else {
        None
    }
}

/// Names a new pet, from `--name` when it is valid or else by asking.
fn create_pet(
    term: &mut Terminal,
    name: Option<&str>,
    owner: Option<String>,
    notice: Option<String>,
) -> Result<Option<Pet>> {
    let mut error = notice.map(|n| Line::colored(n, Color::Yellow));
    if let Some(name) = name {
        match Pet::new(name, owner.clone(), Utc::now()) {
            Ok(pet) => return Ok(Some(pet)),
            Err(e) => error = Some(Line::colored(format!(">> {e}"), Color::Red)),
        }
    }

    let mut edit = LineEdit::new(NAME_MAX);
    loop {
        let mut lines = vec![
            Line::title("WELCOME!"),
            Line::plain(""),
            Line::plain(format!(
                "What would you like to name your pet? {}",
                edit.preview()
            )),
            Line::plain(""),
            Line::colored("Enter to confirm, Esc to quit", Color::DarkGrey),
        ];
        if let Some(err) = &error {
            lines.insert(1, err.clone());
        }
        term.present(&lines)?;

        match edit.apply(&next_key()?) {
            LineStep::Editing => {}
            LineStep::Cancel => return Ok(None),
            LineStep::Submit(text) => match Pet::new(&text, owner.clone(), Utc::now()) {
                Ok(pet) => return Ok(Some(pet)),
                Err(e) => error = Some(Line::colored(format!(">> {e}"), Color::Red)),
            },
        }
    }
}

pub(crate) fn run(cli: Cli, paths: Paths) -> Result<()> {
    match App::init(cli, paths)? {
        Some(mut app) => app.run(),
        None => Ok(()),
    }
}
