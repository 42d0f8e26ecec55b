use std::any::type_name;

use kube::Resource;

pub fn pretty_type_name<'a, T>() -> &'a str {
    type_name::<T>().split("::").last().unwrap_or_default()
}

pub trait RequireMetadata<E> {
    fn require_name_or(&self, error: E) -> Result<&str, E>;
}

impl<T: Resource, E> RequireMetadata<E> for T {
    fn require_name_or(&self, error: E) -> Result<&str, E> {
        Ok(self.meta().name.as_ref().ok_or(error)?.as_str())
    }
}
