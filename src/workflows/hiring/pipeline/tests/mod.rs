mod common;
mod decision;
mod weights;
