#![allow(dead_code)]

#[derive(mailform::form::FormModel)]
enum Channel {
    Email,
    Phone,
}

fn main() {}
