//! Custom TUI widgets

use crate::model::{CategoryTag, Quartile};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// Display colour of a quartile
pub fn quartile_color(quartile: Quartile) -> Color {
    match quartile {
        Quartile::Q1 => Color::Cyan,
        Quartile::Q2 => Color::Green,
        Quartile::Q3 => Color::Yellow,
        Quartile::Q4 => Color::Red,
        Quartile::Unranked => Color::Gray,
    }
}

/// A coloured quartile badge
pub struct QuartileBadge {
    quartile: Quartile,
}

impl QuartileBadge {
    pub fn new(quartile: Quartile) -> Self {
        Self { quartile }
    }

    pub fn to_span(&self) -> Span<'static> {
        Span::styled(
            format!(" {:<2} ", self.quartile),
            Style::default()
                .fg(Color::Black)
                .bg(quartile_color(self.quartile))
                .add_modifier(Modifier::BOLD),
        )
    }
}

/// One detail-view line for a category membership
pub fn category_line(tag: &CategoryTag) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        QuartileBadge::new(tag.quartile).to_span(),
        Span::raw(" "),
        Span::raw(tag.label.clone()),
    ])
}

/// A key hint widget for showing keyboard shortcuts
pub struct KeyHints<'a> {
    hints: Vec<(&'a str, &'a str)>,
}

impl<'a> KeyHints<'a> {
    pub fn new(hints: Vec<(&'a str, &'a str)>) -> Self {
        Self { hints }
    }
}

impl<'a> Widget for KeyHints<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let spans: Vec<Span> = self
            .hints
            .iter()
            .flat_map(|(key, desc)| {
                vec![
                    Span::styled(
                        format!("[{}]", key),
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(format!(" {} ", desc)),
                ]
            })
            .collect();

        let line = Line::from(spans);
        let paragraph = Paragraph::new(line).style(Style::default().fg(Color::DarkGray));

        paragraph.render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quartile_badge() {
        let span = QuartileBadge::new(Quartile::Q1).to_span();
        assert_eq!(span.content, " Q1 ");
        assert_eq!(span.style.bg, Some(Color::Cyan));

        let span = QuartileBadge::new(Quartile::Unranked).to_span();
        assert_eq!(span.content, " -  ");
        assert_eq!(span.style.bg, Some(Color::Gray));
    }

    #[test]
    fn test_category_line() {
        let line = category_line(&CategoryTag::new("Oncology", Quartile::Q4));
        assert_eq!(line.spans.len(), 4);
        assert_eq!(line.spans[3].content, "Oncology");
        assert_eq!(line.spans[1].style.bg, Some(Color::Red));
    }
}
