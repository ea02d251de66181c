mod common;
mod overrides;
mod requests;
