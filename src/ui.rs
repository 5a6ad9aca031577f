//! Terminal UI rendering with ratatui

use crate::board::Cell;
use crate::game::{Game, GameState};
use crate::settings::Settings;
use crate::tetromino::{ColorIndex, PALETTE_SIZE};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

/// Width of the stats panel next to the board
const STATS_WIDTH: u16 = 16;

/// Palette indexed by [`ColorIndex`]
const PALETTE: [Color; PALETTE_SIZE] = [
    Color::Rgb(0, 127, 255),
    Color::Rgb(0, 255, 127),
    Color::Rgb(255, 127, 0),
    Color::Rgb(255, 0, 127),
    Color::Rgb(127, 255, 0),
    Color::Rgb(127, 0, 255),
    Color::Rgb(255, 255, 0),
    Color::Rgb(255, 0, 255),
    Color::Rgb(0, 255, 0),
    Color::Rgb(255, 0, 0),
];

fn palette(color: ColorIndex) -> Color {
    PALETTE.get(color as usize).copied().unwrap_or(Color::White)
}

/// Render the board, the falling piece and the stats panel
pub fn render_game(frame: &mut Frame, game: &Game, settings: &Settings) {
    let area = frame.area();

    // Each cell is two characters wide, plus borders
    let board_width = game.board.width() as u16 * 2 + 2;
    let board_height = game.board.height() as u16 + 2;
    let game_area = center_rect(area, board_width + STATS_WIDTH, board_height);

    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(board_width),
            Constraint::Length(STATS_WIDTH),
        ])
        .split(game_area);

    render_board(frame, layout[0], game, settings);
    render_stats(frame, layout[1], game);

    if game.state == GameState::GameOver {
        render_overlay(
            frame,
            area,
            "GAME OVER",
            &format!("Score: {}", game.score.points),
        );
    }
}

/// Center a rect within another rect
fn center_rect(area: Rect, width: u16, height: u16) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn render_board(frame: &mut Frame, area: Rect, game: &Game, settings: &Settings) {
    let (block_char, empty_char) = settings.visual.block_chars();

    let block = Block::default()
        .title(" Falling Blocks ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let piece = game.current_piece.visible_positions();
    let lines: Vec<Line> = game
        .board
        .rows()
        .enumerate()
        .map(|(y, row)| {
            let spans: Vec<Span> = row
                .iter()
                .enumerate()
                .map(|(x, cell)| {
                    if piece.contains(&(x as i32, y as i32)) {
                        return Span::styled(
                            block_char,
                            Style::default().fg(palette(game.current_piece.color)),
                        );
                    }
                    match cell {
                        Cell::Filled(color) => {
                            Span::styled(block_char, Style::default().fg(palette(*color)))
                        }
                        Cell::Empty => Span::styled(empty_char, Style::default().fg(Color::DarkGray)),
                    }
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Render stats panel
fn render_stats(frame: &mut Frame, area: Rect, game: &Game) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = vec![
        Line::from(Span::styled("SCORE", Style::default().fg(Color::Gray))),
        Line::from(Span::styled(
            format!("{}", game.score.points),
            Style::default().fg(Color::Yellow).bold(),
        )),
        Line::raw(""),
        Line::from(Span::styled("LINES", Style::default().fg(Color::Gray))),
        Line::from(Span::styled(
            format!("{}", game.score.lines),
            Style::default().fg(Color::Green),
        )),
        Line::raw(""),
        Line::from(Span::styled("SPEED", Style::default().fg(Color::Gray))),
        Line::from(Span::styled(
            format!("{} ms", game.score.tick_interval_ms()),
            Style::default().fg(Color::Cyan),
        )),
    ];

    if let Some(clear) = &game.last_clear {
        lines.push(Line::raw(""));
        lines.push(Line::styled(
            format!("+{} ({} rows)", clear.points, clear.rows.len()),
            Style::default().fg(Color::Magenta).bold(),
        ));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Render an overlay (for game over)
fn render_overlay(frame: &mut Frame, area: Rect, title: &str, subtitle: &str) {
    let popup_width = 24u16;
    let popup_height = 5u16;
    let popup_area = center_rect(area, popup_width, popup_height);

    // Clear the background
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::Black));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let text = vec![
        Line::styled(title.to_string(), Style::default().fg(Color::Yellow).bold()),
        Line::raw(""),
        Line::styled(subtitle.to_string(), Style::default().fg(Color::Gray)),
    ];

    let paragraph = Paragraph::new(text).alignment(Alignment::Center);
    frame.render_widget(paragraph, inner);
}
