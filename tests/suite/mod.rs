mod brainstorm;
mod config;
mod errors;
mod practice;
