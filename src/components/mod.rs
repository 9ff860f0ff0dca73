pub mod book_net;
