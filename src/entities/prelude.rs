pub use super::image_models::Entity as ImageModels;
pub use super::orders::Entity as Orders;
pub use super::stock_prompts::Entity as StockPrompts;
pub use super::tokens::Entity as Tokens;
