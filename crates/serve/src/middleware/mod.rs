//! Middleware for the HotelFinder HTTP server

pub mod rate_limit;
