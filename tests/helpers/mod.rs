#![allow(dead_code)]

pub mod login;
pub mod mockserver;
pub mod paths;
