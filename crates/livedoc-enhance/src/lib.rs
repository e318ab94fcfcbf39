pub mod dom;
pub mod enhancer;
pub mod observer;
pub mod registry;

pub use dom::{Document, DomError, NodeId, SharedDocument};
pub use enhancer::{
    CodeBlockEnhancer, EnhanceError, WidgetFactory, WidgetResolver, ENHANCED_ATTR, WIDGET_ATTR,
};
pub use observer::{page_events, PageEvent, PageEvents, ScanDriver};
pub use registry::ProcessedElementRegistry;
