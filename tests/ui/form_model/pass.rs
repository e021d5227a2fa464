use mailform::form::{FieldLens, FormModel};

#[derive(Clone, mailform::form::FormModel)]
struct CallbackForm {
    phone_number: String,
    best_time: String,
}

fn main() {
    let fields = CallbackForm::fields();
    let lens = fields.phone_number();
    let mut model = CallbackForm {
        phone_number: "555-0100".to_string(),
        best_time: "mornings".to_string(),
    };
    lens.set(&mut model, "555-0199".to_string());
    assert_eq!(lens.key().as_str(), "phone_number");
    assert_eq!(lens.get(&model), "555-0199");
    assert_eq!(fields.best_time().key().as_str(), "best_time");
    let _: CallbackFormPhoneNumberLens = lens;
}
