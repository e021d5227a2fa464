#![allow(dead_code)]

#[derive(mailform::form::FormModel)]
struct Draft<T> {
    value: T,
}

fn main() {}
