mod async_callable;
mod lifecycle;
mod mock_callable;
mod mock_constructor;
mod patch_attribute;
mod sample;
mod strict_mock;
