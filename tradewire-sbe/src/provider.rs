/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! SBE provider registration.

use crate::flow::SbeSessionMessenger;
use crate::order::SbeRequestMessageFactory;
use crate::report::SbeResponseMessageFactory;
use std::sync::{Arc, Once};
use tradewire_buffer::BufferPool;
use tradewire_core::message::{
    RequestMessageFactory, ResponseMessageFactory, SessionMessenger,
};
use tradewire_core::provider::MessageProvider;

/// Encoding name under which this provider registers.
pub const ENCODING_NAME: &str = "SBE";

/// The SBE codec provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct SbeProvider;

impl MessageProvider for SbeProvider {
    fn name(&self) -> &'static str {
        ENCODING_NAME
    }

    fn request_factory(&self, pool: BufferPool) -> Box<dyn RequestMessageFactory> {
        Box::new(SbeRequestMessageFactory::new(pool))
    }

    fn response_factory(&self) -> Box<dyn ResponseMessageFactory> {
        Box::new(SbeResponseMessageFactory::new())
    }

    fn session_messenger(&self) -> Box<dyn SessionMessenger> {
        Box::new(SbeSessionMessenger::new())
    }
}

/// Registers the SBE provider with the process-wide registry.
///
/// Safe to call from multiple init paths; registration happens once.
pub fn register() {
    static REGISTER: Once = Once::new();
    REGISTER.call_once(|| {
        tradewire_core::provider::register_provider(Arc::new(SbeProvider));
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_registered_under_sbe() {
        register();
        register();

        let provider = tradewire_core::provider::find_provider(ENCODING_NAME).unwrap();
        assert_eq!(provider.name(), "SBE");
    }

    #[test]
    fn test_factories_constructible() {
        let provider = SbeProvider;
        let pool = BufferPool::new();

        let requests = provider.request_factory(pool);
        let order = requests.new_order_single();
        assert!(!order_is_empty(order));

        let _responses = provider.response_factory();
        let _messenger = provider.session_messenger();
    }

    fn order_is_empty(order: Box<dyn tradewire_core::message::MutableNewOrderSingle>) -> bool {
        order.into_buffer().is_empty()
    }
}
