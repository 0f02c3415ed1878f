use crate::memory::{CHIP8_RAM_SIZE_BYTES, HEX_ROW_BYTES};
use crate::snapshot::Snapshot;
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use std::io;
use tui::backend::{Backend, CrosstermBackend};
use tui::layout::{Constraint, Direction, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::symbols::Marker;
use tui::text::Spans;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use tui::{Frame, Terminal};

const MEMORY_ROWS: usize = CHIP8_RAM_SIZE_BYTES / HEX_ROW_BYTES;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scroll {
    Down,
    Up,
    Top,
    Bottom,
}

/// Screen is whatever shows snapshots to the user. It should abstract the
/// implementation details, so a variety of kinds of screen would work.
pub trait Screen {
    fn render(&mut self, snapshot: &Snapshot) -> io::Result<()>;

    /// move around the memory listing
    fn scroll(&mut self, scroll: Scroll);
}

// store useful metadata about the chip-8 display
struct Resolution(usize, usize);

impl Resolution {
    fn pixel_count(&self) -> usize {
        self.0 * self.1
    }

    fn x_bounds(&self) -> [f64; 2] {
        [0.0, (self.0 - 1) as f64]
    }

    fn y_bounds(&self) -> [f64; 2] {
        [-1.0 * (self.1 - 1) as f64, 0.0]
    }

    /// canvas coordinates of every pixel with the given value; y is
    /// negated so row 0 is at the top
    fn points(&self, frame: &[u8], value: u8) -> Vec<(f64, f64)> {
        let w = self.0;
        frame
            .iter()
            .take(self.pixel_count())
            .enumerate()
            .filter(|(_, p)| **p == value)
            .map(|(n, _)| ((n % w) as f64, -1.0 * (n / w) as f64))
            .collect()
    }
}

/// Which memory row is selected. Follows the program counter, except that
/// scrolling takes over until the program counter moves to another row.
#[derive(Default)]
struct MemoryCursor {
    selected: usize,
    followed_row: Option<usize>,
}

impl MemoryCursor {
    fn follow(&mut self, pc_row: usize) {
        if self.followed_row != Some(pc_row) {
            self.followed_row = Some(pc_row);
            self.selected = pc_row;
        }
    }

    fn scroll(&mut self, scroll: Scroll) {
        let last = MEMORY_ROWS - 1;
        self.selected = match scroll {
            Scroll::Down => (self.selected + 1).min(last),
            Scroll::Up => self.selected.saturating_sub(1),
            Scroll::Top => 0,
            Scroll::Bottom => last,
        };
    }
}

/// registers, stack, keys, memory and the display, in a terminal, rendered
/// using TUI and crossterm
pub struct Dashboard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    title: String,
    memory: MemoryCursor,
}

impl Dashboard {
    /// take over the terminal; it is handed back when the dashboard drops
    pub fn new(title: &str) -> io::Result<Dashboard> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.hide_cursor()?;
        terminal.clear()?;
        Ok(Dashboard {
            terminal,
            title: title.to_string(),
            memory: MemoryCursor::default(),
        })
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        warn_on_err("leave raw mode", disable_raw_mode());
        warn_on_err(
            "leave the alternate screen",
            execute!(io::stdout(), LeaveAlternateScreen),
        );
        warn_on_err("show the cursor", self.terminal.show_cursor());
    }
}

// handing the terminal back can't fail the caller, so just record it
fn warn_on_err(what: &str, result: io::Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            log::warn!("could not {}: {}", what, e);
            false
        }
    }
}

impl Screen for Dashboard {
    fn render(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        self.memory.follow(snapshot.pc_row);
        let mut memory_state = ListState::default();
        memory_state.select(Some(self.memory.selected));
        let title = &self.title;

        self.terminal.draw(|f| {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Percentage(66), Constraint::Percentage(34)].as_ref())
                .split(f.size());
            let top = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(75), Constraint::Percentage(25)].as_ref())
                .split(rows[0]);
            let bottom = Layout::default()
                .direction(Direction::Horizontal)
                .constraints(
                    [
                        Constraint::Percentage(13),
                        Constraint::Percentage(13),
                        Constraint::Percentage(12),
                        Constraint::Percentage(62),
                    ]
                    .as_ref(),
                )
                .split(rows[1]);

            draw_screen(f, top[0], snapshot);
            draw_info(f, top[1], title, snapshot);
            draw_registers(f, bottom[0], snapshot);
            draw_list(f, bottom[1], "Stack", snapshot.stack_rows());
            draw_list(f, bottom[2], "Keys", snapshot.key_rows());

            let memory = List::new(
                snapshot
                    .memory_rows()
                    .into_iter()
                    .map(ListItem::new)
                    .collect::<Vec<_>>(),
            )
            .block(Block::default().title("Memory").borders(Borders::ALL))
            .style(Style::default().fg(Color::Yellow))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::Yellow));
            f.render_stateful_widget(memory, bottom[3], &mut memory_state);
        })?;
        Ok(())
    }

    fn scroll(&mut self, scroll: Scroll) {
        self.memory.scroll(scroll);
    }
}

fn draw_screen<B: Backend>(f: &mut Frame<B>, area: Rect, snapshot: &Snapshot) {
    let resolution = Resolution(snapshot.width, snapshot.height);
    let off = resolution.points(snapshot.frame.as_slice(), 0);
    let on = resolution.points(snapshot.frame.as_slice(), 1);
    let canvas = Canvas::default()
        .block(
            Block::default()
                .title("CHIP-8")
                .borders(Borders::ALL)
                .style(Style::default().bg(Color::Black)),
        )
        .x_bounds(resolution.x_bounds())
        .y_bounds(resolution.y_bounds())
        .marker(Marker::Block)
        .paint(|ctx| {
            ctx.draw(&Points {
                coords: &off,
                color: Color::Black,
            });
            ctx.draw(&Points {
                coords: &on,
                color: Color::White,
            });
        });
    f.render_widget(canvas, area);
}

fn draw_info<B: Backend>(f: &mut Frame<B>, area: Rect, title: &str, snapshot: &Snapshot) {
    let text: Vec<Spans> = snapshot.info_rows().into_iter().map(Spans::from).collect();
    let info = Paragraph::new(text)
        .block(
            Block::default()
                .title(format!("INFO {}", title))
                .borders(Borders::ALL),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(info, area);
}

fn draw_registers<B: Backend>(f: &mut Frame<B>, area: Rect, snapshot: &Snapshot) {
    let items: Vec<ListItem> = snapshot
        .register_rows()
        .into_iter()
        .zip(snapshot.registers.iter())
        .map(|(row, reg)| {
            let item = ListItem::new(row);
            if reg.changed {
                item.style(Style::default().add_modifier(Modifier::BOLD))
            } else {
                item
            }
        })
        .collect();
    let list = List::new(items)
        .block(Block::default().title("Registers").borders(Borders::ALL))
        .style(Style::default().fg(Color::Yellow));
    f.render_widget(list, area);
}

fn draw_list<B: Backend>(f: &mut Frame<B>, area: Rect, title: &str, rows: Vec<String>) {
    let list = List::new(rows.into_iter().map(ListItem::new).collect::<Vec<_>>())
        .block(Block::default().title(title.to_string()).borders(Borders::ALL))
        .style(Style::default().fg(Color::Yellow));
    f.render_widget(list, area);
}

/// useful for testing non-display routines
#[derive(Default)]
pub struct DummyScreen {
    pub frames: usize,
    pub last_pc: Option<u16>,
    pub scrolls: Vec<Scroll>,
}

impl Screen for DummyScreen {
    fn render(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        self.frames += 1;
        self.last_pc = Some(snapshot.pc);
        Ok(())
    }

    fn scroll(&mut self, scroll: Scroll) {
        self.scrolls.push(scroll);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_count() {
        let r = Resolution(64, 32);
        assert_eq!(r.pixel_count(), 2048)
    }

    #[test]
    fn test_x_bounds() {
        let r = Resolution(64, 32);
        assert_eq!(r.x_bounds(), [0.0, 63.0]);
    }

    #[test]
    fn test_y_bounds() {
        let r = Resolution(64, 32);
        assert_eq!(r.y_bounds(), [-31.0, 0.0]);
    }

    #[test]
    fn test_points_split_by_value() {
        let r = Resolution(64, 32);
        let mut frame = [0u8; 2048];
        frame[0] = 1;
        frame[64 + 3] = 1;
        let on = r.points(&frame, 1);
        assert_eq!(on, vec![(0.0, 0.0), (3.0, -1.0)]);
        assert_eq!(r.points(&frame, 0).len(), 2046);
    }

    #[test]
    fn test_restore_failures_are_reported() {
        assert!(warn_on_err("show the cursor", Ok(())));
        let broken = io::Error::new(io::ErrorKind::BrokenPipe, "terminal gone");
        assert!(!warn_on_err("show the cursor", Err(broken)));
    }

    #[test]
    fn test_memory_cursor_follows_pc() {
        let mut c = MemoryCursor::default();
        c.follow(0x20);
        assert_eq!(c.selected, 0x20);
        c.scroll(Scroll::Down);
        c.scroll(Scroll::Down);
        // same pc row: the user's scrolling sticks
        c.follow(0x20);
        assert_eq!(c.selected, 0x22);
        // pc moved on: follow it again
        c.follow(0x21);
        assert_eq!(c.selected, 0x21);
    }

    #[test]
    fn test_memory_cursor_clamps() {
        let mut c = MemoryCursor::default();
        c.scroll(Scroll::Up);
        assert_eq!(c.selected, 0);
        c.scroll(Scroll::Bottom);
        assert_eq!(c.selected, 255);
        c.scroll(Scroll::Down);
        assert_eq!(c.selected, 255);
        c.scroll(Scroll::Top);
        assert_eq!(c.selected, 0);
    }
}
