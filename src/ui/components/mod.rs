mod notice;
mod status_bar;

pub use notice::Notice;
pub use status_bar::draw_status_bar;
