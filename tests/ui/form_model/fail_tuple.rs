#![allow(dead_code)]

#[derive(mailform::form::FormModel)]
struct Callback(String, String);

fn main() {}
