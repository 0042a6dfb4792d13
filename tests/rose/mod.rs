mod api;
mod ordering;
