mod book_list;

pub use book_list::BookListView;
