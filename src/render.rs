use chrono::{DateTime, Duration, Local, Utc};
use crossterm::{
    cursor, execute, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, EndSynchronizedUpdate,
        EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};
use termipet::model::{Pet, FOODS};
use termipet::SimEvent;

const RULE_WIDTH: usize = 50;

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Line {
    pub(crate) text: String,
    pub(crate) fg: Color,
    pub(crate) bold: bool,
}

impl Line {
    pub(crate) fn plain(text: impl Into<String>) -> Self {
        Self::colored(text, Color::White)
    }

    pub(crate) fn colored(text: impl Into<String>, fg: Color) -> Self {
        Self {
            text: text.into(),
            fg,
            bold: false,
        }
    }

    pub(crate) fn title(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fg: Color::Cyan,
            bold: true,
        }
    }

    fn rule(ch: char) -> Self {
        Self::colored(ch.to_string().repeat(RULE_WIDTH), Color::DarkGrey)
    }
}

pub(crate) struct Terminal {
    out: io::Stdout,
    color: bool,
    active: bool,
}

impl Terminal {
    pub(crate) fn begin(color: bool) -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;
        Ok(Self {
            out,
            color,
            active: true,
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        queue!(
            self.out,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn present(&mut self, lines: &[Line]) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate, Clear(ClearType::All))?;
        for (y, line) in lines.iter().enumerate() {
            queue!(self.out, cursor::MoveTo(0, y as u16))?;
            if self.color {
                queue!(self.out, SetForegroundColor(line.fg))?;
            }
            if line.bold {
                queue!(self.out, SetAttribute(Attribute::Bold))?;
            }
            queue!(self.out, Print(&line.text), SetAttribute(Attribute::Reset), ResetColor)?;
        }
        queue!(self.out, EndSynchronizedUpdate)?;
        self.out.flush()?;
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        // leave the user's shell usable even when unwinding
        let _ = self.end();
    }
}

pub(crate) fn menu_lines() -> Vec<Line> {
    vec![
        Line::rule('='),
        Line::title("ACTIONS"),
        Line::rule('='),
        Line::plain("1. View pet status"),
        Line::plain("2. Feed pet"),
        Line::plain("3. Go to bed"),
        Line::plain("4. Wake up"),
        Line::plain("5. Save and exit"),
        Line::rule('='),
    ]
}

pub(crate) fn food_lines() -> Vec<Line> {
    let mut lines = vec![Line::rule('-'), Line::title("FOOD MENU"), Line::rule('-')];
    for (i, food) in FOODS.iter().enumerate() {
        lines.push(Line::plain(format!(
            "{}. {} (+{} fullness)",
            i + 1,
            food.name,
            food.fill
        )));
    }
    lines.push(Line::rule('-'));
    lines.push(Line::colored("Esc to go back", Color::DarkGrey));
    lines
}

pub(crate) fn status_lines(pet: &Pet, now: DateTime<Utc>) -> Vec<Line> {
    let st = &pet.state;
    let mut lines = vec![Line::rule('='), Line::title("PET STATUS"), Line::rule('=')];
    lines.push(Line::plain(format!("Name: {}", pet.name)));
    if let Some(owner) = &pet.owner {
        lines.push(Line::plain(format!("Owner: {owner}")));
    }
    lines.push(Line::plain(format!("Age: {} days", pet.age_days)));
    lines.push(stat_line("Fullness", st.fullness));
    lines.push(stat_line("Energy  ", st.energy));
    lines.push(Line::plain(format!("Status: {}", st.sleep.label())));

    if let Some(since) = st.fullness_zero_since {
        lines.push(Line::colored(
            format!("Fullness at 0% for: {}", floor_duration(now - since)),
            Color::Red,
        ));
    }
    if let Some(since) = st.energy_zero_since {
        lines.push(Line::colored(
            format!("Energy at 0% for: {}", floor_duration(now - since)),
            Color::Red,
        ));
    }
    lines.push(Line::rule('='));
    lines.push(Line::colored("Any key to go back", Color::DarkGrey));
    lines
}

pub(crate) fn recap_lines(pet: &Pet, events: &[SimEvent]) -> Vec<Line> {
    let mut lines = vec![Line::title("While you were away…"), Line::plain("")];
    lines.extend(events.iter().map(|ev| Line::plain(event_text(&pet.name, ev))));
    lines.push(Line::plain(""));
    lines.push(Line::colored("Press any key", Color::DarkGrey));
    lines
}

pub(crate) fn event_text(name: &str, ev: &SimEvent) -> String {
    match ev {
        SimEvent::FellAsleep { at } => {
            format!("{name} fell asleep from exhaustion at {}", clock(*at))
        }
        SimEvent::WokeUp { at } => format!("{name} woke up rested at {}", clock(*at)),
        SimEvent::Starving { since } => {
            format!("{name} has been starving since {}", clock(*since))
        }
    }
}

fn clock(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%b %e %H:%M").to_string()
}

fn stat_line(label: &str, value: f64) -> Line {
    let fg = if value < 20.0 {
        Color::Red
    } else if value < 50.0 {
        Color::Yellow
    } else {
        Color::Green
    };
    // whole percent, truncated
    Line::colored(
        format!("{label}: {} {}%", bar(value / 100.0, 20), value as u32),
        fg,
    )
}

fn bar(value01: f64, width: usize) -> String {
    let v = value01.clamp(0.0, 1.0);
    let fill = (v * width as f64 + 0.5) as usize;
    let mut s = String::new();
    s.push('[');
    for i in 0..width {
        s.push(if i < fill { '█' } else { ' ' });
    }
    s.push(']');
    s
}

/// `1h 2m 3s`, `2m 3s` or `3s`.
pub(crate) fn floor_duration(d: Duration) -> String {
    let secs = d.num_seconds().max(0);
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}h {m}m {s}s")
    } else if m > 0 {
        format!("{m}m {s}s")
    } else {
        format!("{s}s")
    }
}
