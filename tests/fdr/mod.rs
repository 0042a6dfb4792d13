mod flood;
mod select;
