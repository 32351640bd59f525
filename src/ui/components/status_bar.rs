use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use super::Notice;

/// Draw the status bar: the current notice if any, otherwise background
/// activity for the list.
pub fn draw_status_bar(frame: &mut Frame, area: Rect, notice: Option<&Notice>, activity: &str) {
  let line = match notice {
    Some(notice) => Line::from(vec![
      Span::raw(" "),
      Span::styled(notice.message.clone(), Style::default().fg(notice.color()).bold()),
    ]),
    None => Line::from(vec![
      Span::raw(" "),
      Span::styled(activity.to_string(), Style::default().fg(Color::DarkGray)),
    ]),
  };

  let paragraph = Paragraph::new(line).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}
