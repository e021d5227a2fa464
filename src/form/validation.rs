use std::sync::Arc;

use super::controller::{
    FieldErrors, FieldKey, FormController, FormError, FormResult, SyncFieldValidatorFn,
    ensure_live, read_lock, write_lock,
};

pub trait ValidationError: Clone + Send + Sync + 'static {
    fn message(&self) -> String;
}

pub trait FieldLens<T>: Copy + Send + Sync + 'static {
    type Value: Clone + PartialEq + Send + Sync + 'static;

    fn key(self) -> FieldKey;
    fn get<'a>(self, model: &'a T) -> &'a Self::Value;
    fn set(self, model: &mut T, value: Self::Value);
}

pub trait FormModel: Clone + Send + Sync + 'static {
    type Fields;

    fn fields() -> Self::Fields;
}

pub trait FieldValidator<T, L, E>: Send + Sync
where
    L: FieldLens<T>,
    E: ValidationError,
{
    fn validate(&self, model: &T, value: &L::Value) -> Result<(), E>;
}

impl<T, L, E, F> FieldValidator<T, L, E> for F
where
    L: FieldLens<T>,
    E: ValidationError,
    F: for<'a> Fn(&'a T, &'a L::Value) -> Result<(), E> + Send + Sync,
{
    fn validate(&self, model: &T, value: &L::Value) -> Result<(), E> {
        (self)(model, value)
    }
}

impl<T, E> FormController<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: ValidationError,
{
    /// Appends a rule for `lens`.
    ///
    /// Fields are checked in the order they first received a rule and rules
    /// within a field in registration order. Only the first failing rule of a
    /// field is reported.
    pub fn register_field_validator<L, V>(&self, lens: L, validator: V) -> FormResult<()>
    where
        L: FieldLens<T>,
        V: FieldValidator<T, L, E> + 'static,
    {
        let key = lens.key();
        let validator = Arc::new(validator);
        let wrapped: SyncFieldValidatorFn<T, E> =
            Arc::new(move |model: &T| validator.validate(model, lens.get(model)));
        let mut validators = write_lock(&self.field_validators, "registering field validator")?;
        match validators.iter_mut().find(|(candidate, _)| *candidate == key) {
            Some((_, rules)) => rules.push(wrapped),
            None => validators.push((key, vec![wrapped])),
        }
        Ok(())
    }

    /// Writes a field value.
    ///
    /// An existing error on that field is dropped right away whether or not
    /// the new value would pass; nothing is re-validated until the next submit.
    /// Edits are refused with [`FormError::Busy`] while a submission is
    /// outstanding or its success window is open.
    pub fn set<L>(&self, lens: L, value: L::Value) -> FormResult<()>
    where
        L: FieldLens<T>,
    {
        let key = lens.key();
        {
            let mut state = write_lock(&self.state, "writing form model")?;
            ensure_live(&state)?;
            if state.phase.is_busy() {
                return Err(FormError::Busy(state.phase));
            }
            lens.set(&mut state.model, value);
            if state.errors.remove(key).is_some() {
                tracing::debug!(form = state.id.0, field = %key, "cleared field error on edit");
            }
        }
        self.publish()
    }

    pub fn get<L>(&self, lens: L) -> FormResult<L::Value>
    where
        L: FieldLens<T>,
    {
        Ok(lens
            .get(&read_lock(&self.state, "reading field value")?.model)
            .clone())
    }

    pub fn clear_field_error<L>(&self, lens: L) -> FormResult<()>
    where
        L: FieldLens<T>,
    {
        {
            let mut state = write_lock(&self.state, "clearing field error")?;
            ensure_live(&state)?;
            state.errors.remove(lens.key());
        }
        self.publish()
    }

    /// Recomputes every field error and publishes the result.
    pub fn validate_form(&self) -> FormResult<bool> {
        let is_valid = self.recompute_errors()?;
        self.publish()?;
        Ok(is_valid)
    }

    pub(super) fn recompute_errors(&self) -> FormResult<bool> {
        let model = read_lock(&self.state, "reading model for form validation")?
            .model
            .clone();
        let validators = read_lock(
            &self.field_validators,
            "reading field validators for form validation",
        )?
        .clone();

        let mut errors = FieldErrors::new();
        for (key, rules) in validators {
            if let Some(error) = rules.iter().find_map(|rule| rule(&model).err()) {
                errors.insert(key, error);
            }
        }

        let is_valid = errors.is_empty();
        let mut state = write_lock(&self.state, "applying form validation result")?;
        ensure_live(&state)?;
        state.errors = errors;
        Ok(is_valid)
    }
}
