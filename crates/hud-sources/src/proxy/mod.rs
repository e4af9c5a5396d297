mod app_indicator_service;
mod app_menu_registrar;

pub(crate) use app_indicator_service::{ApplicationDescription, AppIndicatorServiceProxy};
pub(crate) use app_menu_registrar::AppMenuRegistrarProxy;
