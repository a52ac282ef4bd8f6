use proc_macro::TokenStream;
use syn::{
    parse::Parser, punctuated::Punctuated, token::Comma, AttrStyle, DeriveInput, ItemStruct,
};

#[macro_use]
extern crate quote;
#[macro_use]
extern crate syn;

extern crate proc_macro;

trait ToMap<T, K, V> {
    fn to_map(&self) -> syn::Result<std::collections::HashMap<K, V>>;
}

impl ToMap<Punctuated<syn::Meta, Comma>, syn::Ident, Option<proc_macro2::TokenStream>>
    for Punctuated<syn::Meta, Comma>
{
    /// Convert a list of attribute arguments to a HashMap.
    fn to_map(&self) -> syn::Result<std::collections::HashMap<syn::Ident, Option<proc_macro2::TokenStream>>> {
        self.iter()
            .map(|m| match m {
                syn::Meta::NameValue(arg) => {
                    if let syn::Expr::Lit(lit) = &arg.value {
                        if let syn::Lit::Str(arg_str) = &lit.lit {
                            let value = if let Ok(call) = arg_str.parse::<syn::ExprCall>() {
                                quote! { #call }
                            } else if let Ok(ident) = arg_str.parse::<syn::Ident>() {
                                quote! { #ident }
                            } else if let Ok(lit) = arg_str.parse::<syn::Lit>() {
                                quote! { #lit }
                            } else if let Ok(path) = arg_str.parse::<syn::ExprPath>() {
                                quote! { #path }
                            } else {
                                return Err(syn::Error::new_spanned(
                                    &arg.value,
                                    "argument value should be a: variable, literal, function call",
                                ));
                            };

                            Ok((arg.path.get_ident().unwrap().clone(), Some(value)))
                        } else {
                            Err(syn::Error::new_spanned(&arg.value, "argument value should be a string literal"))
                        }
                    } else {
                        Err(syn::Error::new_spanned(&arg.value, "argument value should be a string literal"))
                    }
                }
                syn::Meta::Path(arg) => Ok((arg.get_ident().unwrap().clone(), None)),
                _ => Err(syn::Error::new_spanned(
                    m,
                    "argument type should be Path or NameValue: `#[bt(default)]`, or `#[bt(default = \"String::new()\")]`",
                )),
            })
            .collect()
    }
}

trait ConcatTokenStream {
    fn concat(&self, value: proc_macro2::TokenStream) -> proc_macro2::TokenStream;
}

impl ConcatTokenStream for proc_macro2::TokenStream {
    fn concat(&self, value: proc_macro2::TokenStream) -> proc_macro2::TokenStream {
        if self.is_empty() {
            if value.is_empty() {
                proc_macro2::TokenStream::new()
            } else {
                quote! { #value }
            }
        } else if value.is_empty() {
            quote! { #self }
        } else {
            quote! { #self, #value }
        }
    }
}

/// Expands `#[bt_node(NodeType)]` into the struct plus its `config`/`status`
/// fields and a `new()` constructor taking any fields the node declared
/// without `#[bt(default)]`.
fn create_bt_node(args: TokenStream, mut item: ItemStruct) -> syn::Result<proc_macro2::TokenStream> {
    let args_parsed = syn::punctuated::Punctuated::<syn::Path, syn::Token![,]>::parse_terminated.parse(args)?;

    let mut derives = vec![quote! { Clone, ::std::fmt::Debug, ::ethology::derive::TreeNodeDefaults }];
    let mut builtin_fields = proc_macro2::TokenStream::new();

    for arg in args_parsed.iter() {
        arg.require_ident()?;

        let ident = arg.get_ident().unwrap().to_string();

        match ident.as_str() {
            "SyncActionNode" => derives.push(quote! { ::ethology::derive::ActionNode, ::ethology::derive::SyncActionNode }),
            "StatefulActionNode" => {
                derives.push(quote! { ::ethology::derive::ActionNode, ::ethology::derive::StatefulActionNode });
                builtin_fields = builtin_fields.concat(quote! { halt_requested: ::std::cell::RefCell::new(false) });
            }
            "ThreadedActionNode" => {
                derives.push(quote! { ::ethology::derive::ActionNode, ::ethology::derive::ThreadedActionNode });
                builtin_fields = builtin_fields.concat(quote! { worker: None });
            }
            "ControlNode" => {
                derives.push(quote! { ::ethology::derive::ControlNode });
                builtin_fields = builtin_fields.concat(quote! { children: Vec::new() });
            }
            "DecoratorNode" => {
                derives.push(quote! { ::ethology::derive::DecoratorNode });
                builtin_fields = builtin_fields.concat(quote! { child: None });
            }
            _ => return Err(syn::Error::new_spanned(arg, "unsupported node type")),
        }
    }

    let mut default_fields = builtin_fields;
    let mut manual_fields = proc_macro2::TokenStream::new();
    let mut manual_fields_with_types = proc_macro2::TokenStream::new();

    match &mut item.fields {
        syn::Fields::Named(fields) => {
            for f in fields.named.iter_mut() {
                let name = f.ident.as_ref().unwrap();
                let ty = &f.ty;

                let mut used_default = false;
                for a in f.attrs.iter() {
                    if a.path().is_ident("bt") {
                        let args: Punctuated<syn::Meta, Comma> = a.parse_args_with(Punctuated::parse_terminated)?;
                        let args_map = args.to_map()?;

                        if let Some(value) = args_map.get(&syn::parse_str("default")?) {
                            used_default = true;
                            let default_value = if let Some(default_value) = value {
                                quote! { #default_value }
                            } else {
                                quote! { #ty::default() }
                            };

                            default_fields = default_fields.concat(quote! { #name: #default_value });
                        }
                    }
                }

                if !used_default {
                    manual_fields = manual_fields.concat(quote! { #name });
                    manual_fields_with_types = manual_fields_with_types.concat(quote! { #name: #ty });
                }

                f.attrs = f.attrs.clone().into_iter().filter(|a| !a.path().is_ident("bt")).collect();
            }

            fields
                .named
                .push(syn::Field::parse_named.parse2(quote! { pub config: ::ethology::nodes::NodeConfig }).unwrap());
            fields
                .named
                .push(syn::Field::parse_named.parse2(quote! { pub status: ::ethology::basic_types::NodeStatus }).unwrap());

            for arg in args_parsed.iter() {
                match arg.get_ident().unwrap().to_string().as_str() {
                    "ControlNode" => fields.named.push(
                        syn::Field::parse_named.parse2(quote! { pub children: Vec<::ethology::nodes::TreeNodePtr> }).unwrap(),
                    ),
                    "DecoratorNode" => fields.named.push(
                        syn::Field::parse_named.parse2(quote! { pub child: Option<::ethology::nodes::TreeNodePtr> }).unwrap(),
                    ),
                    "StatefulActionNode" => fields.named.push(
                        syn::Field::parse_named
                            .parse2(quote! { pub halt_requested: ::std::cell::RefCell<bool> })
                            .unwrap(),
                    ),
                    "ThreadedActionNode" => fields.named.push(
                        syn::Field::parse_named
                            .parse2(quote! { pub worker: Option<::ethology::nodes::WorkerHandle> })
                            .unwrap(),
                    ),
                    _ => {}
                }
            }
        }
        _ => return Err(syn::Error::new_spanned(item, "expected a struct with named fields")),
    };

    let mut user_attrs = Vec::new();

    for attr in item.attrs.iter() {
        if attr.path().is_ident("derive") {
            derives.push(attr.parse_args()?);
        } else if let AttrStyle::Outer = attr.style {
            user_attrs.push(attr);
        }
    }

    let user_attrs = user_attrs.into_iter().fold(proc_macro2::TokenStream::new(), |acc, a| {
        if acc.is_empty() {
            quote! { #a }
        } else {
            quote! { #acc #a }
        }
    });

    let derives = derives.into_iter().fold(proc_macro2::TokenStream::new(), |acc, d| {
        if acc.is_empty() {
            quote! { #d }
        } else {
            quote! { #acc, #d }
        }
    });

    let ident = &item.ident;
    let vis = &item.vis;
    let struct_fields = &item.fields;

    let extra_fields = proc_macro2::TokenStream::new().concat(default_fields).concat(manual_fields);

    let output = quote! {
        #user_attrs
        #[derive(#derives)]
        #vis struct #ident #struct_fields

        impl #ident {
            pub fn new(config: ::ethology::nodes::NodeConfig, #manual_fields_with_types) -> #ident {
                Self {
                    config,
                    status: ::ethology::basic_types::NodeStatus::Idle,
                    #extra_fields
                }
            }
        }
    };

    Ok(output)
}

#[proc_macro_attribute]
pub fn bt_node(args: TokenStream, input: TokenStream) -> TokenStream {
    let item = parse_macro_input!(input as ItemStruct);

    create_bt_node(args, item).unwrap_or_else(syn::Error::into_compile_error).into()
}

#[proc_macro_derive(TreeNodeDefaults)]
pub fn derive_tree_node(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let ident = input.ident;

    let expanded = quote! {
        impl ::ethology::nodes::TreeNodeDefaults for #ident {
            fn status(&self) -> ::ethology::basic_types::NodeStatus {
                self.status
            }

            fn reset_status(&mut self) {
                self.status = ::ethology::basic_types::NodeStatus::Idle
            }

            fn set_status(&mut self, status: ::ethology::basic_types::NodeStatus) {
                self.status = status;
            }

            fn config(&mut self) -> &mut ::ethology::nodes::NodeConfig {
                &mut self.config
            }

            fn into_boxed(self) -> Box<dyn ::ethology::nodes::TreeNodeBase> {
                Box::new(self)
            }

            fn to_tree_node_ptr(&self) -> ::ethology::nodes::TreeNodePtr {
                std::rc::Rc::new(std::cell::RefCell::new(self.clone()))
            }

            fn clone_node_boxed(&self) -> Box<dyn ::ethology::nodes::TreeNodeBase> {
                Box::new(self.clone())
            }
        }

        impl ::ethology::nodes::TreeNodeBase for #ident {}
    };

    TokenStream::from(expanded)
}

#[proc_macro_derive(ActionNode)]
pub fn derive_action_node(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let ident = input.ident;

    let expanded = quote! {
        impl ::ethology::nodes::ActionNode for #ident {
            fn clone_boxed(&self) -> Box<dyn ::ethology::nodes::ActionNodeBase> {
                Box::new(self.clone())
            }

            fn execute_action_tick(&mut self) -> Result<::ethology::basic_types::NodeStatus, ::ethology::error::NodeError> {
                match self.tick()? {
                    ::ethology::basic_types::NodeStatus::Idle => Err(::ethology::error::NodeError::StatusError(self.config.path.clone(), "IDLE".to_string())),
                    status => Ok(status),
                }
            }
        }

        impl ::ethology::nodes::ActionNodeBase for #ident {}

        impl ::ethology::nodes::GetNodeType for #ident {
            fn node_type(&self) -> ::ethology::basic_types::NodeType {
                ::ethology::basic_types::NodeType::Action
            }
        }
    };

    TokenStream::from(expanded)
}

#[proc_macro_derive(ControlNode)]
pub fn derive_control_node(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let ident = input.ident;

    let expanded = quote! {
        impl ::ethology::nodes::ControlNode for #ident {
            fn add_child(&mut self, child: ::ethology::nodes::TreeNodePtr) {
                self.children.push(child);
            }

            fn children(&self) -> &Vec<::ethology::nodes::TreeNodePtr> {
                &self.children
            }

            fn halt_control(&mut self) {
                self.reset_children();
            }

            fn halt_child(&self, index: usize) -> Result<(), ::ethology::error::NodeError> {
                match self.children.get(index) {
                    Some(child) => {
                        if child.borrow().status() == ::ethology::basic_types::NodeStatus::Running {
                            child.borrow_mut().halt();
                        }
                        child.borrow_mut().reset_status();
                        Ok(())
                    }
                    None => Err(::ethology::error::NodeError::IndexError),
                }
            }

            fn halt_children(&self, start: usize) -> Result<(), ::ethology::error::NodeError> {
                if start > self.children.len() {
                    return Err(::ethology::error::NodeError::IndexError);
                }

                for i in start..self.children.len() {
                    self.halt_child(i)?;
                }

                Ok(())
            }

            fn reset_children(&self) {
                self.halt_children(0).unwrap();
            }

            fn clone_boxed(&self) -> Box<dyn ::ethology::nodes::ControlNodeBase> {
                Box::new(self.clone())
            }
        }

        impl ::ethology::nodes::NodeTick for #ident {
            fn execute_tick(&mut self) -> Result<::ethology::basic_types::NodeStatus, ::ethology::error::NodeError> {
                self.tick()
            }
        }

        impl ::ethology::nodes::ControlNodeBase for #ident {}

        impl ::ethology::nodes::GetNodeType for #ident {
            fn node_type(&self) -> ::ethology::basic_types::NodeType {
                ::ethology::basic_types::NodeType::Control
            }
        }
    };

    TokenStream::from(expanded)
}

#[proc_macro_derive(DecoratorNode)]
pub fn derive_decorator_node(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let ident = input.ident;

    let expanded = quote! {
        impl ::ethology::nodes::DecoratorNode for #ident {
            fn set_child(&mut self, child: ::ethology::nodes::TreeNodePtr) {
                self.child = Some(child);
            }

            fn child(&self) -> Result<&::ethology::nodes::TreeNodePtr, ::ethology::error::NodeError> {
                match &self.child {
                    Some(child) => Ok(child),
                    None => Err(::ethology::error::NodeError::ChildMissing),
                }
            }

            fn halt_decorator(&mut self) {
                self.reset_child();
            }

            fn reset_child(&self) {
                if let Some(child) = self.child.as_ref() {
                    if matches!(child.borrow().status(), ::ethology::basic_types::NodeStatus::Running) {
                        child.borrow_mut().halt();
                    }

                    child.borrow_mut().reset_status();
                }
            }

            fn clone_boxed(&self) -> Box<dyn ::ethology::nodes::DecoratorNodeBase> {
                Box::new(self.clone())
            }
        }

        impl ::ethology::nodes::NodeTick for #ident {
            fn execute_tick(&mut self) -> Result<::ethology::basic_types::NodeStatus, ::ethology::error::NodeError> {
                if self.child.is_none() {
                    return Err(::ethology::error::NodeError::ChildMissing);
                }

                self.tick()
            }
        }

        impl ::ethology::nodes::DecoratorNodeBase for #ident {}

        impl ::ethology::nodes::GetNodeType for #ident {
            fn node_type(&self) -> ::ethology::basic_types::NodeType {
                ::ethology::basic_types::NodeType::Decorator
            }
        }
    };

    TokenStream::from(expanded)
}

#[proc_macro_derive(SyncActionNode)]
pub fn derive_sync_action_node(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let ident = input.ident;

    let expanded = quote! {
        impl ::ethology::nodes::NodeTick for #ident {
            fn execute_tick(&mut self) -> Result<::ethology::basic_types::NodeStatus, ::ethology::error::NodeError> {
                match <Self as ::ethology::nodes::ActionNode>::execute_action_tick(self)? {
                    ::ethology::basic_types::NodeStatus::Running => Err(::ethology::error::NodeError::StatusError(self.config.path.clone(), "RUNNING".to_string())),
                    status => Ok(status),
                }
            }
        }

        // A sync action never reports RUNNING, so there's never anything
        // in flight for a halt to interrupt.
        impl ::ethology::nodes::NodeHalt for #ident {
            fn halt(&mut self) {}
        }
    };

    TokenStream::from(expanded)
}

#[proc_macro_derive(StatefulActionNode)]
pub fn derive_stateful_action_node(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let ident = input.ident;

    let expanded = quote! {
        impl ::ethology::nodes::NodeTick for #ident where #ident: ::ethology::nodes::StatefulActionNode {
            fn execute_tick(&mut self) -> Result<::ethology::basic_types::NodeStatus, ::ethology::error::NodeError> {
                let prev_status = <Self as ::ethology::nodes::TreeNodeDefaults>::status(self);

                let new_status = match prev_status {
                    ::ethology::basic_types::NodeStatus::Idle => {
                        let new_status = self.on_start()?;
                        if matches!(new_status, ::ethology::basic_types::NodeStatus::Idle) {
                            return Err(::ethology::error::NodeError::StatusError(format!("{}::on_start()", self.config.path), "IDLE".to_string()));
                        }
                        new_status
                    }
                    ::ethology::basic_types::NodeStatus::Running => {
                        let new_status = self.on_running()?;
                        if matches!(new_status, ::ethology::basic_types::NodeStatus::Idle) {
                            return Err(::ethology::error::NodeError::StatusError(format!("{}::on_running()", self.config.path), "IDLE".to_string()));
                        }
                        new_status
                    }
                    prev_status => prev_status,
                };

                <Self as ::ethology::nodes::TreeNodeDefaults>::set_status(self, new_status);

                Ok(new_status)
            }
        }

        impl ::ethology::nodes::NodeHalt for #ident {
            fn halt(&mut self) {
                *self.halt_requested.borrow_mut() = true;

                if matches!(<Self as ::ethology::nodes::TreeNodeDefaults>::status(self), ::ethology::basic_types::NodeStatus::Running) {
                    self.on_halted();
                }
            }
        }
    };

    TokenStream::from(expanded)
}

#[proc_macro_derive(ThreadedActionNode)]
pub fn derive_threaded_action_node(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let ident = input.ident;

    let expanded = quote! {
        impl ::ethology::nodes::NodeTick for #ident where #ident: ::ethology::nodes::ThreadedActionNode {
            fn execute_tick(&mut self) -> Result<::ethology::basic_types::NodeStatus, ::ethology::error::NodeError> {
                match <Self as ::ethology::nodes::TreeNodeDefaults>::status(self) {
                    ::ethology::basic_types::NodeStatus::Idle => {
                        self.start_worker()?;
                        <Self as ::ethology::nodes::TreeNodeDefaults>::set_status(self, ::ethology::basic_types::NodeStatus::Running);
                        Ok(::ethology::basic_types::NodeStatus::Running)
                    }
                    ::ethology::basic_types::NodeStatus::Running => {
                        let outcome = self.worker.as_ref().and_then(|w| w.poll());

                        match outcome {
                            None => Ok(::ethology::basic_types::NodeStatus::Running),
                            Some(Ok(status)) => {
                                self.worker = None;
                                <Self as ::ethology::nodes::TreeNodeDefaults>::set_status(self, status);
                                Ok(status)
                            }
                            Some(Err(e)) => {
                                self.worker = None;
                                <Self as ::ethology::nodes::TreeNodeDefaults>::set_status(self, ::ethology::basic_types::NodeStatus::Idle);
                                Err(::ethology::error::NodeError::UserError(::ethology::anyhow::anyhow!(e)))
                            }
                        }
                    }
                    prev_status => Ok(prev_status),
                }
            }
        }

        impl ::ethology::nodes::NodeHalt for #ident {
            fn halt(&mut self) {
                if let Some(worker) = self.worker.take() {
                    worker.request_halt();

                    while worker.poll().is_none() {
                        worker.wakeup.wait_for(::std::time::Duration::from_millis(10));
                    }
                }

                <Self as ::ethology::nodes::TreeNodeDefaults>::set_status(self, ::ethology::basic_types::NodeStatus::Idle);
            }
        }
    };

    TokenStream::from(expanded)
}
