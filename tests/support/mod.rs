#![allow(dead_code)]

pub mod models;
