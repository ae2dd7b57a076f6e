use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use termipet::model::FOODS;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MenuAction {
    ViewStatus,
    Feed,
    GoToBed,
    WakeUp,
    SaveAndExit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FoodChoice {
    Pick(usize),
    Back,
}

/// Blocks until the next key press.
pub(crate) fn next_key() -> anyhow::Result<KeyEvent> {
    loop {
        if let Event::Key(k) = event::read()? {
            if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat {
                return Ok(k);
            }
        }
    }
}

fn is_interrupt(key: &KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        && key.modifiers.contains(KeyModifiers::CONTROL)
}

pub(crate) fn map_menu_key(key: &KeyEvent) -> Option<MenuAction> {
    if is_interrupt(key) {
        return Some(MenuAction::SaveAndExit);
    }
    match key.code {
        KeyCode::Char('1') => Some(MenuAction::ViewStatus),
        KeyCode::Char('2') => Some(MenuAction::Feed),
        KeyCode::Char('3') => Some(MenuAction::GoToBed),
        KeyCode::Char('4') => Some(MenuAction::WakeUp),
        KeyCode::Char('5') | KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
            Some(MenuAction::SaveAndExit)
        }
        _ => None,
    }
}

pub(crate) fn map_food_key(key: &KeyEvent) -> Option<FoodChoice> {
    if is_interrupt(key) {
        return Some(FoodChoice::Back);
    }
    match key.code {
        KeyCode::Esc => Some(FoodChoice::Back),
        KeyCode::Char(ch) => {
            let n = ch.to_digit(10)? as usize;
            (1..=FOODS.len()).contains(&n).then(|| FoodChoice::Pick(n - 1))
        }
        _ => None,
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum LineStep {
    Editing,
    Submit(String),
    Cancel,
}

/// Single-line text entry for raw mode.
pub(crate) struct LineEdit {
    buf: String,
    max: usize,
}

impl LineEdit {
    pub(crate) fn new(max: usize) -> Self {
        Self {
            buf: String::new(),
            max,
        }
    }

    pub(crate) fn apply(&mut self, key: &KeyEvent) -> LineStep {
        if is_interrupt(key) {
            return LineStep::Cancel;
        }
        match key.code {
            KeyCode::Enter => LineStep::Submit(std::mem::take(&mut self.buf)),
            KeyCode::Esc => LineStep::Cancel,
            KeyCode::Backspace => {
                self.buf.pop();
                LineStep::Editing
            }
            KeyCode::Char(ch) if !ch.is_control() => {
                if self.buf.chars().count() < self.max {
                    self.buf.push(ch);
                }
                LineStep::Editing
            }
            _ => LineStep::Editing,
        }
    }

    pub(crate) fn preview(&self) -> String {
        format!("{}_", self.buf)
    }
}
